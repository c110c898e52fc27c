use tokio::sync::watch;

/// Something a range bound can be read from at filtering time.
///
/// Bounds are read on every evaluation, never cached, so a predicate always
/// reflects the current contents of its inputs. `None` means the bound is absent.
pub trait BoundSource {
    fn bound(&self) -> Option<f64>;
}

impl BoundSource for str {
    fn bound(&self) -> Option<f64> {
        parse_bound(self)
    }
}

impl BoundSource for String {
    fn bound(&self) -> Option<f64> {
        parse_bound(self)
    }
}

impl BoundSource for Option<f64> {
    fn bound(&self) -> Option<f64> {
        *self
    }
}

/// The live text of an input box, as published by a `watch::Sender<String>`.
impl BoundSource for watch::Receiver<String> {
    fn bound(&self) -> Option<f64> {
        parse_bound(&self.borrow())
    }
}

impl<T: BoundSource + ?Sized> BoundSource for &T {
    fn bound(&self) -> Option<f64> {
        (**self).bound()
    }
}

/// Accepts table rows whose value in `column` lies within `[min, max]`.
///
/// An absent bound leaves that side open; with both absent every row passes.
#[derive(Debug, Clone)]
pub struct RangeFilter<Min, Max> {
    column: usize,
    min: Min,
    max: Max,
}

impl<Min: BoundSource, Max: BoundSource> RangeFilter<Min, Max> {
    pub fn new(column: usize, min: Min, max: Max) -> Self {
        Self { column, min, max }
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Cells that are missing or not numeric count as 0.
    pub fn accepts<S: AsRef<str>>(&self, row: &[S]) -> bool {
        let value = row
            .get(self.column)
            .map(|cell| parse_cell(cell.as_ref()))
            .unwrap_or(0.0);
        within(value, self.min.bound(), self.max.bound())
    }

    /// Consumes the filter into a plain predicate for table search extensions.
    pub fn into_predicate(self) -> impl Fn(&[String]) -> bool {
        move |row: &[String]| self.accepts(row)
    }
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    match (min, max) {
        (None, None) => true,
        (None, Some(max)) => value <= max,
        (Some(min), None) => min <= value,
        (Some(min), Some(max)) => min <= value && value <= max,
    }
}

/// Reads a bound the way a numeric input box is read: leading whitespace is
/// skipped and the optional sign plus leading digits form an integer.
/// `"12abc"` is 12, `"10.9"` is 10, and text with no leading digit is absent.
pub fn parse_bound(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = leading_digits(unsigned.as_bytes(), 0);
    if digits == 0 {
        return None;
    }
    let magnitude: f64 = unsigned[..digits].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Reads a table cell as the longest leading decimal literal, or 0.
pub fn parse_cell(text: &str) -> f64 {
    match leading_float(text) {
        Some(value) if !value.is_nan() => value,
        _ => 0.0,
    }
}

fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();

    let mut end = usize::from(matches!(bytes.first(), Some(b'+') | Some(b'-')));
    if text[end..].starts_with("Infinity") {
        return Some(if text.starts_with('-') { f64::NEG_INFINITY } else { f64::INFINITY });
    }

    let int_digits = leading_digits(bytes, end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = leading_digits(bytes, end + 1);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = leading_digits(bytes, exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    text[..end].parse().ok()
}

fn leading_digits(bytes: &[u8], start: usize) -> usize {
    bytes
        .get(start..)
        .map_or(0, |rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: &str) -> Vec<String> {
        vec!["2".to_string(), "Cannonball".to_string(), value.to_string()]
    }

    #[test]
    fn empty_bounds_accept_everything() {
        let filter = RangeFilter::new(2, "", "");
        for value in ["-5", "0", "12.5", "1e9", "abc"] {
            assert!(filter.accepts(&row(value)), "rejected {}", value);
        }
    }

    #[test]
    fn both_bounds_are_inclusive() {
        let filter = RangeFilter::new(2, "10", "20");
        assert!(!filter.accepts(&row("9.99")));
        assert!(filter.accepts(&row("10")));
        assert!(filter.accepts(&row("15")));
        assert!(filter.accepts(&row("20")));
        assert!(!filter.accepts(&row("20.01")));
    }

    #[test]
    fn only_max_present() {
        let filter = RangeFilter::new(2, "", "20");
        assert!(filter.accepts(&row("-100")));
        assert!(filter.accepts(&row("20")));
        assert!(!filter.accepts(&row("21")));
    }

    #[test]
    fn only_min_present() {
        let filter = RangeFilter::new(2, "10", "");
        assert!(!filter.accepts(&row("9")));
        assert!(filter.accepts(&row("10")));
        assert!(filter.accepts(&row("1000000")));
    }

    #[test]
    fn non_numeric_bound_is_absent_on_that_side() {
        let filter = RangeFilter::new(2, "ten", "20");
        assert!(filter.accepts(&row("-3")));
        assert!(!filter.accepts(&row("30")));
    }

    #[test]
    fn unparseable_cell_counts_as_zero() {
        let filter = RangeFilter::new(2, "0", "0");
        assert!(filter.accepts(&row("n/a")));
        assert!(filter.accepts(&["only one cell"]));
    }

    #[test]
    fn bounds_are_read_live_from_watch_channels() {
        let (min_tx, min_rx) = watch::channel(String::new());
        let (max_tx, max_rx) = watch::channel(String::new());
        let predicate = RangeFilter::new(2, min_rx, max_rx).into_predicate();

        assert!(predicate(&row("50")));
        max_tx.send_replace("40".to_string());
        assert!(!predicate(&row("50")));
        min_tx.send_replace("45".to_string());
        max_tx.send_replace("".to_string());
        assert!(predicate(&row("50")));
        assert!(!predicate(&row("44")));
    }

    #[test]
    fn bound_parsing_takes_the_leading_integer() {
        assert_eq!(parse_bound("  12abc"), Some(12.0));
        assert_eq!(parse_bound("10.9"), Some(10.0));
        assert_eq!(parse_bound("-7"), Some(-7.0));
        assert_eq!(parse_bound("+3"), Some(3.0));
        assert_eq!(parse_bound(""), None);
        assert_eq!(parse_bound("-"), None);
        assert_eq!(parse_bound(".5"), None);
    }

    #[test]
    fn cell_parsing_takes_the_leading_decimal() {
        assert_eq!(parse_cell("0.625"), 0.625);
        assert_eq!(parse_cell(" -1.5e3 coins"), -1500.0);
        assert_eq!(parse_cell(".5"), 0.5);
        assert_eq!(parse_cell("5."), 5.0);
        assert_eq!(parse_cell("2e"), 2.0);
        assert_eq!(parse_cell("1,234"), 1.0);
        assert_eq!(parse_cell("Infinity"), f64::INFINITY);
        assert_eq!(parse_cell("-"), 0.0);
        assert_eq!(parse_cell(""), 0.0);
    }
}
