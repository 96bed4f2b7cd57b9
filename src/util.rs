/// Checks that a numerical value is in the provided interval and returns
/// a [`ConfigError::OutOfInterval`](crate::error::ConfigError::OutOfInterval) from the
/// enclosing function if not
///
/// The interval is closed by default. Prefix it with `open` to exclude the lower bound.
///
/// ### Example
/// ```ignore
/// let alpha = 2.0;
/// check_interval!(alpha, open 0.0, 1.0);
/// ```
/// This returns an error with the message "invalid value for \`alpha\`: 2 is not in the interval (0, 1]".
#[macro_export]
macro_rules! check_interval {
    ($var:expr, open $a:expr, $b:expr) => {
        if !($var > $a && $var <= $b) {
            return Err($crate::error::ConfigError::OutOfInterval {
                name: stringify!($var),
                value: $var as f64,
                interval: format!("({}, {}]", $a, $b),
            });
        }
    };
    ($var:expr, $a:expr, $b:expr) => {
        if !($var >= $a && $var <= $b) {
            return Err($crate::error::ConfigError::OutOfInterval {
                name: stringify!($var),
                value: $var as f64,
                interval: format!("[{}, {}]", $a, $b),
            });
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::error::{ConfigError, Result};

    fn checked(alpha: f64) -> Result<f64> {
        check_interval!(alpha, open 0.0, 1.0);
        Ok(alpha)
    }

    fn checked_closed(gamma: f64) -> Result<f64> {
        check_interval!(gamma, 0.0, 1.0);
        Ok(gamma)
    }

    #[test]
    fn check_interval_functional() {
        assert!(checked(1.0).is_ok());
        assert!(checked(0.5).is_ok());
        assert!(checked(0.0).is_err(), "Open lower bound is excluded");
        assert!(checked(f64::NAN).is_err(), "NaN is rejected");
        assert!(checked_closed(0.0).is_ok(), "Closed lower bound is included");
        assert!(checked_closed(1.1).is_err());
    }

    #[test]
    fn check_interval_message() {
        let err = checked(2.0).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfInterval {
                name: "alpha",
                value: 2.0,
                interval: String::from("(0, 1]"),
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid value for `alpha`: 2 is not in the interval (0, 1]"
        );
    }
}
