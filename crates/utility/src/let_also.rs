/// Kotlin-style scope functions, handy at the end of long method chains.
pub trait LetAlso: Sized {
    /// Passes the value by ownership into `f` and returns whatever `f` returns.
    fn let_owned<R, F>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }

    /// Passes a reference into `f` and returns the value itself.
    fn also<F>(self, f: F) -> Self
    where
        F: FnOnce(&Self),
    {
        f(&self);
        self
    }
}

impl<T> LetAlso for T {}
