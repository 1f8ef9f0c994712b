use anyhow::{Result, bail};
use breach_core::Difficulty;

const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed tokens into a deduplicated list, preserving order.
///
/// Accepts decimal integers (negative values use their magnitude) and
/// `0x`-prefixed hex.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();
    for token in tokens {
        if token.is_empty() {
            continue;
        }
        let seed = if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16).ok()
        } else if let Ok(value) = token.parse::<i64>() {
            Some(value.unsigned_abs())
        } else {
            token.parse::<u64>().ok()
        };
        let Some(seed) = seed else {
            bail!("Unrecognized seed token: {token}");
        };
        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }
    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }
    Ok(seeds)
}

/// Resolve difficulty tokens; `all` expands to every difficulty.
pub fn resolve_difficulties(tokens: &[String]) -> Result<Vec<Difficulty>> {
    let mut difficulties = Vec::new();
    for token in tokens {
        let expanded = if token.eq_ignore_ascii_case("all") {
            Difficulty::ALL.to_vec()
        } else {
            match token.parse::<Difficulty>() {
                Ok(difficulty) => vec![difficulty],
                Err(err) => bail!(err),
            }
        };
        for difficulty in expanded {
            if !difficulties.contains(&difficulty) {
                difficulties.push(difficulty);
            }
        }
    }
    if difficulties.is_empty() {
        difficulties.push(Difficulty::default());
    }
    Ok(difficulties)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn resolves_numeric_and_hex() {
        let seeds = resolve_seed_inputs(&tokens(&["42", "-7", "0xff", "42"])).unwrap();
        assert_eq!(seeds, vec![42, 7, 255]);
        assert_eq!(
            resolve_seed_inputs(&tokens(&["18446744073709551615"])).unwrap(),
            vec![u64::MAX]
        );
    }

    #[test]
    fn rejects_garbage_and_defaults_when_empty() {
        assert!(resolve_seed_inputs(&tokens(&["banana"])).is_err());
        assert_eq!(resolve_seed_inputs(&[]).unwrap(), vec![DEFAULT_SEED]);
    }

    #[test]
    fn difficulties_expand_all() {
        let all = resolve_difficulties(&tokens(&["hard", "all"])).unwrap();
        assert_eq!(all, vec![Difficulty::Hard, Difficulty::Normal, Difficulty::Insane]);
        assert!(resolve_difficulties(&tokens(&["nightmare"])).is_err());
    }
}
