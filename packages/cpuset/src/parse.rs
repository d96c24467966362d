use crate::set::MAX_CPU_ID;
use crate::{CpuId, CpuSet, Error};

/// Parses one or more range list strings into a [`CpuSet`].
///
/// Each token is a comma-separated list of items, where each item is a processor number or an
/// inclusive `low-high` range. A missing `high` means "up to the last supported processor" and
/// reversed ranges are swapped. Tokens after the first continue the same list, as if they had
/// been joined with commas. Anything after the leading digits of a number is ignored, so text read
/// from a file including its trailing newline parses fine.
///
/// Empty tokens and a trailing comma are accepted. An empty string yields an empty set.
///
/// See [package-level documentation][crate] for details.
///
/// # Errors
///
/// Returns [`Error::NotACpuRange`] if an item does not start with a decimal digit and
/// [`Error::CpuOutOfRange`] if a range endpoint is at or beyond [`CpuSet::capacity()`].
///
/// # Example
///
/// ```
/// let cpus = cpuset::parse_ranges(&["0-3,8"]).unwrap();
/// assert_eq!(cpus.count(), 5);
///
/// // Multiple tokens continue the same list.
/// let cpus = cpuset::parse_ranges(&["0-1", "4"]).unwrap();
/// assert_eq!(cpus.to_string(), "0-1,4");
/// ```
pub fn parse_ranges(tokens: &[&str]) -> crate::Result<CpuSet> {
    let mut cpus = CpuSet::new();

    for token in tokens {
        let mut items = token.split(',').peekable();

        while let Some(item) = items.next() {
            if item.is_empty() && items.peek().is_none() {
                // Empty token or trailing comma.
                break;
            }

            let (low, high) = parse_item(item)?;

            for cpu in low..=high {
                cpus.set(cpu)?;
            }
        }
    }

    Ok(cpus)
}

/// Parses a hexadecimal processor bitmap, such as the `cpumap` files exposed by Linux.
///
/// The input is a comma-separated list of 32-bit hexadecimal words with the most significant word
/// first: the rightmost word describes processors 0-31, the one to its left 32-63 and so on.
///
/// There is no error path. Malformed words parse as their leading hexadecimal digits (or zero if
/// there are none) and bits describing processors beyond the capacity are dropped.
///
/// # Example
///
/// ```
/// let cpus = cpuset::parse_hexmap("f,3");
/// assert_eq!(cpus.to_string(), "0-1,32-35");
/// ```
#[must_use]
pub fn parse_hexmap(cpumap: &str) -> CpuSet {
    let mut cpus = CpuSet::new();

    for (group, word) in cpumap.rsplit(',').enumerate() {
        let base = group.saturating_mul(32);
        let mut bits = leading_hex(word);

        while bits != 0 {
            let bit = bits.trailing_zeros() as usize;
            bits &= bits.wrapping_sub(1);

            let Some(cpu) = base
                .checked_add(bit)
                .and_then(|cpu| CpuId::try_from(cpu).ok())
            else {
                break;
            };

            // Bits are visited in ascending order, so the rest is out of range, too.
            if cpus.set(cpu).is_err() {
                break;
            }
        }
    }

    cpus
}

fn parse_item(item: &str) -> crate::Result<(CpuId, CpuId)> {
    if !item.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(Error::NotACpuRange {
            value: item.to_string(),
        });
    }

    let low = leading_decimal(item);

    let high = match item.split_once('-') {
        Some((_, "")) => u64::from(MAX_CPU_ID),
        Some((_, high)) => leading_decimal(high),
        None => low,
    };

    let (low, high) = if high < low { (high, low) } else { (low, high) };

    let high = CpuId::try_from(high)
        .ok()
        .filter(|high| *high <= MAX_CPU_ID)
        .ok_or(Error::CpuOutOfRange {
            cpu: high,
            max: MAX_CPU_ID,
        })?;

    #[expect(
        clippy::cast_possible_truncation,
        reason = "low <= high, which was just verified to fit"
    )]
    let low = low as CpuId;

    Ok((low, high))
}

/// Value of the decimal digits at the start of the string, zero if there are none.
/// Saturates instead of overflowing.
fn leading_decimal(s: &str) -> u64 {
    s.bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0_u64, |value, digit| {
            value
                .saturating_mul(10)
                .saturating_add(u64::from(digit.wrapping_sub(b'0')))
        })
}

/// Value of the hexadecimal digits at the start of the string (after optional whitespace and
/// `0x` prefix), zero if there are none. Saturates instead of overflowing.
fn leading_hex(s: &str) -> u64 {
    let s = s.trim_start();
    let s = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);

    s.chars()
        .map_while(|c| c.to_digit(16))
        .try_fold(0_u64, |value, digit| {
            value.checked_mul(16)?.checked_add(u64::from(digit))
        })
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::MAX_CPUS;

    fn ids(cpus: &CpuSet) -> Vec<CpuId> {
        cpus.iter().collect()
    }

    #[test]
    fn parse_ranges_smoke_test() {
        assert!(parse_ranges(&[""]).unwrap().is_empty());
        assert!(parse_ranges(&[]).unwrap().is_empty());

        assert_eq!(ids(&parse_ranges(&["5"]).unwrap()), vec![5]);
        assert_eq!(ids(&parse_ranges(&["0,1,2,3"]).unwrap()), vec![0, 1, 2, 3]);
        assert_eq!(ids(&parse_ranges(&["2,3,1"]).unwrap()), vec![1, 2, 3]);
        assert_eq!(
            ids(&parse_ranges(&["0-5,1-6"]).unwrap()),
            vec![0, 1, 2, 3, 4, 5, 6]
        );
        assert_eq!(ids(&parse_ranges(&["0-0,1-1,3-3"]).unwrap()), vec![0, 1, 3]);
    }

    #[test]
    fn parse_ranges_documented_example() {
        let cpus = parse_ranges(&["0-3,8"]).unwrap();

        assert_eq!(cpus.count(), 5);
        assert!(cpus.test(2));
        assert!(!cpus.test(4));
        assert!(cpus.test(8));
    }

    #[test]
    fn reversed_range_is_swapped() {
        assert_eq!(
            parse_ranges(&["3-1"]).unwrap(),
            parse_ranges(&["1-3"]).unwrap()
        );
    }

    #[test]
    fn open_range_extends_to_capacity() {
        let cpus = parse_ranges(&["2-"]).unwrap();

        assert_eq!(cpus.count(), MAX_CPUS - 2);
        assert!(!cpus.test(1));
        assert!(cpus.test(MAX_CPU_ID));
    }

    #[test]
    fn later_tokens_continue_the_list() {
        let cpus = parse_ranges(&["0-1,3", "5", "7-8"]).unwrap();
        assert_eq!(ids(&cpus), vec![0, 1, 3, 5, 7, 8]);

        // A trailing comma or empty token adds nothing.
        let cpus = parse_ranges(&["1,", "", "4"]).unwrap();
        assert_eq!(ids(&cpus), vec![1, 4]);
    }

    #[test]
    fn trailing_text_after_number_is_ignored() {
        assert_eq!(ids(&parse_ranges(&["0-2\n"]).unwrap()), vec![0, 1, 2]);
        assert_eq!(ids(&parse_ranges(&["7\n"]).unwrap()), vec![7]);
    }

    #[test]
    fn non_digit_is_not_a_cpu_range() {
        for garbage in ["foo", "-3", " 1", "1,,2", "1,x"] {
            let error = parse_ranges(&[garbage]).unwrap_err();
            assert!(
                matches!(error, Error::NotACpuRange { .. }),
                "{garbage:?} produced {error:?}"
            );
        }

        parse_ranges(&["1", "x"]).unwrap_err();
    }

    #[test]
    fn out_of_capacity_endpoint_is_error() {
        let capacity = MAX_CPUS.to_string();

        let error = parse_ranges(&[capacity.as_str()]).unwrap_err();
        assert!(matches!(
            error,
            Error::CpuOutOfRange { max, .. } if max == MAX_CPU_ID
        ));

        parse_ranges(&[format!("0-{capacity}").as_str()]).unwrap_err();
        parse_ranges(&[format!("{capacity}-0").as_str()]).unwrap_err();
        parse_ranges(&["99999999999999999999999"]).unwrap_err();

        // The last supported processor is fine.
        parse_ranges(&[MAX_CPU_ID.to_string().as_str()]).unwrap();
    }

    #[test]
    fn parse_ranges_round_trips_through_emit() {
        for list in ["0", "0-3,8", "1,3,5-7,20-40", "63"] {
            let cpus = parse_ranges(&[list]).unwrap();
            assert_eq!(cpus.to_string(), list);
        }
    }

    #[test]
    fn parse_hexmap_documented_example() {
        let cpus = parse_hexmap("f,3");
        assert_eq!(ids(&cpus), vec![0, 1, 32, 33, 34, 35]);
    }

    #[test]
    fn parse_hexmap_smoke_test() {
        assert!(parse_hexmap("").is_empty());
        assert!(parse_hexmap("0").is_empty());
        assert_eq!(ids(&parse_hexmap("1")), vec![0]);
        assert_eq!(ids(&parse_hexmap("80000000")), vec![31]);
        assert_eq!(ids(&parse_hexmap("0x5")), vec![0, 2]);
        assert_eq!(ids(&parse_hexmap("00000001,00000000")), vec![32]);
        assert_eq!(ids(&parse_hexmap("ff\n")), (0..8).collect::<Vec<CpuId>>());
    }

    #[test]
    fn parse_hexmap_malformed_is_zero() {
        assert!(parse_hexmap("zz").is_empty());
        assert_eq!(ids(&parse_hexmap("zz,3")), vec![0, 1]);
    }

    #[test]
    fn parse_hexmap_drops_bits_beyond_capacity() {
        let words = MAX_CPUS / 32;
        let mut map = vec!["ffffffff"; words + 1];
        map[0] = "1";

        let cpus = parse_hexmap(&map.join(","));
        assert_eq!(cpus.count(), MAX_CPUS);
    }
}
