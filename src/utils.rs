/// Unwraps an `Option`, or evaluates `$else` (typically `continue` or `return`).
macro_rules! some_or {
    ($e:expr, $else:expr) => {{
        match $e {
            Some(r) => r,
            None => $else,
        }
    }};
}
