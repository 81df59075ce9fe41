use serde::{Deserialize, Deserializer};

/// Convert a distance descriptor to furlongs.
///
/// Accepts the racecard forms "2m4f", "7f", "1m 2f" and a bare number
/// already expressed in furlongs. Returns None for anything unparseable or
/// for a zero distance.
pub fn furlongs(distance: &str) -> Option<f64> {
    let compact: String = distance
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if compact.is_empty() {
        return None;
    }

    if let Ok(value) = compact.parse::<f64>() {
        return (value > 0.0).then_some(value);
    }

    let mut miles = 0u32;
    let mut furlongs = 0u32;
    let mut digits = String::new();
    for c in compact.chars() {
        match c {
            '0'..='9' => digits.push(c),
            'm' => {
                miles = digits.parse().ok()?;
                digits.clear();
            }
            'f' => {
                furlongs = digits.parse().ok()?;
                digits.clear();
            }
            // Yards and anything else after the furlongs are ignored
            _ => digits.clear(),
        }
    }

    let total = miles.checked_mul(8)?.checked_add(furlongs)?;
    (total > 0).then_some(f64::from(total))
}

/// Map a going descriptor onto the 6-point ordinal scale (1 = firm, 6 = heavy).
///
/// All-weather descriptors share the scale: standard sits with good.
pub fn going_scale(going: &str) -> Option<f64> {
    let key = going
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_");
    let value = match key.as_str() {
        "firm" | "hard" => 1.0,
        "good_to_firm" => 2.0,
        "good" | "standard" => 3.0,
        "good_to_soft" | "yielding" | "standard_to_slow" => 4.0,
        "soft" | "yielding_to_soft" | "slow" => 5.0,
        "heavy" | "soft_to_heavy" => 6.0,
        _ => return None,
    };
    Some(value)
}

/// Convert a "st-lb" weight (e.g. "11-4") to total pounds.
pub fn weight_to_lbs(weight: &str) -> Option<u32> {
    let (stone, pounds) = weight.trim().split_once('-')?;
    let stone: u32 = stone.trim().parse().ok()?;
    let pounds: u32 = pounds.trim().parse().ok()?;
    stone.checked_mul(14)?.checked_add(pounds)
}

/// Deserialize a carried weight given either as pounds or as "st-lb".
///
/// Unparseable strings become None rather than failing the whole record.
pub fn de_weight<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawWeight {
        Pounds(u32),
        StonePounds(String),
    }

    Ok(match Option::<RawWeight>::deserialize(deserializer)? {
        Some(RawWeight::Pounds(lbs)) => Some(lbs),
        Some(RawWeight::StonePounds(s)) => weight_to_lbs(&s),
        None => None,
    })
}

/// Lowercase slug used for event ids and cohort keys.
pub fn slugify(seed: &str) -> String {
    let mut slug = String::with_capacity(seed.len());
    let mut pending_dash = false;
    for c in seed.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    slug
}
