use crate::Value;

/// Positional statement parameters, bound in order to the platform placeholders.
pub type Parameters = Vec<Value>;

pub const NO_PARAMS: Parameters = Vec::new();

#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use crate::Value;

    #[test]
    fn params_macro_converts_values() {
        let params = params!["001_init", 12_i64, None::<i64>];
        assert_eq!(
            params,
            vec![
                Value::String("001_init".to_string()),
                Value::Int(12),
                Value::NULL
            ]
        );
        assert!(params!().is_empty());
    }
}
