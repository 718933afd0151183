/// Builds an [`LlsdValue`](crate::LlsdValue) from a JSON-like literal.
///
/// `undef` stands for the undefined value. Any other leaf is converted with
/// `LlsdValue::from`, so it may be any expression with a `From` impl;
/// negative numbers and longer expressions need parentheses.
///
/// ```rust
/// use serde_llsd::{llsd, LlsdValue};
///
/// let value = llsd!({ "amy": 23, "bob": undef, "tags": ["x", (-1), true] });
/// assert_eq!(value.get("amy"), Some(&LlsdValue::Integer(23)));
/// assert_eq!(value.get("tags").and_then(|t| t.get_index(1)), Some(&LlsdValue::Integer(-1)));
/// ```
#[macro_export]
macro_rules! llsd {
    (undef) => {
        $crate::LlsdValue::Undefined
    };

    (true) => {
        $crate::LlsdValue::Boolean(true)
    };

    (false) => {
        $crate::LlsdValue::Boolean(false)
    };

    ([]) => {
        $crate::LlsdValue::Array(::std::vec::Vec::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::LlsdValue::Array(vec![$($crate::llsd!($elem)),*])
    };

    ({}) => {
        $crate::LlsdValue::Map($crate::LlsdMap::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut map = $crate::LlsdMap::new();
        $(
            map.insert(::std::string::String::from($key), $crate::llsd!($value));
        )*
        $crate::LlsdValue::Map(map)
    }};

    ($other:expr) => {
        $crate::LlsdValue::from($other)
    };
}
