//! Key Derivation Module
//!
//! Turns the arguments of a call into the key its entry is stored under.

use std::hash::Hash;

/// Derives a cache key from call arguments.
///
/// Must be deterministic: identical arguments always give identical keys.
/// Any `Fn(&A) -> K` closure is a key deriver.
pub trait KeyDeriver<A>: Send + Sync + 'static {
    type Key: Eq + Hash + Clone + Send + Sync + 'static;

    fn derive_key(&self, args: &A) -> Self::Key;
}

/// Uses the argument value itself as the key. The default.
///
/// Operations taking several arguments receive them as one tuple, so this
/// keys on the whole tuple. Use [`FirstArg`] to key on its first element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<A> KeyDeriver<A> for Identity
where
    A: Eq + Hash + Clone + Send + Sync + 'static,
{
    type Key = A;

    fn derive_key(&self, args: &A) -> A {
        args.clone()
    }
}

/// Uses the first element of a tuple of arguments verbatim as the key.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstArg;

macro_rules! impl_first_arg {
    ($first:ident $(, $rest:ident)*) => {
        impl<$first $(, $rest)*> KeyDeriver<($first, $($rest,)*)> for FirstArg
        where
            $first: Eq + Hash + Clone + Send + Sync + 'static,
        {
            type Key = $first;

            fn derive_key(&self, args: &($first, $($rest,)*)) -> $first {
                args.0.clone()
            }
        }
    };
}

impl_first_arg!(A);
impl_first_arg!(A, B);
impl_first_arg!(A, B, C);
impl_first_arg!(A, B, C, D);

impl<A, K, F> KeyDeriver<A> for F
where
    F: Fn(&A) -> K + Send + Sync + 'static,
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    type Key = K;

    fn derive_key(&self, args: &A) -> K {
        self(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_keys_on_whole_argument() {
        assert_eq!(Identity.derive_key(&42u32), 42);
        assert_eq!(
            Identity.derive_key(&("a".to_string(), 1u8)),
            ("a".to_string(), 1u8)
        );
    }

    #[test]
    fn test_first_arg_ignores_trailing_arguments() {
        assert_eq!(FirstArg.derive_key(&("user-1".to_string(),)), "user-1");
        assert_eq!(FirstArg.derive_key(&(7u64, "ignored")), 7);
        assert_eq!(FirstArg.derive_key(&(7u64, 1.5f32, vec![1u8])), 7);
        assert_eq!(FirstArg.derive_key(&('k', (), 0i32, false)), 'k');
    }

    #[test]
    fn test_closure_deriver() {
        let deriver = |args: &(u32, String)| format!("{}:{}", args.0, args.1);
        assert_eq!(deriver.derive_key(&(1u32, "x".to_string())), "1:x");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let args = (3u16, "same".to_string());
        assert_eq!(Identity.derive_key(&args), Identity.derive_key(&args));
        assert_eq!(FirstArg.derive_key(&args), FirstArg.derive_key(&args));
    }
}
