use indexmap::IndexMap;

/// Split a `name=value` assignment on the first `=`. A bare name maps to an
/// empty value.
pub fn parse_assignment(s: &str) -> (&str, &str) {
    match s.split_once('=') {
        Some((key, value)) => (key, value),
        None => (s, ""),
    }
}

/// Parse an `a=1&b=2` packet into an ordered key map. The first occurrence of
/// a key fixes its position, a later duplicate only overwrites the value.
/// Fragments without `=` are ignored.
pub fn parse_packet(packet: &str) -> IndexMap<String, String> {
    let mut params = IndexMap::new();
    for part in packet.split('&') {
        if part.is_empty() || !part.contains('=') {
            continue;
        }
        let (key, value) = parse_assignment(part);
        params.insert(key.to_string(), value.to_string());
    }
    params
}

/// Drop empty groups and empty entries, and pre-split the survivors into
/// key/value pairs. Each surviving group is non-empty.
fn clean_groups(groups: &[Vec<String>]) -> Vec<Vec<(String, String)>> {
    let mut cleaned = Vec::new();
    for group in groups {
        let pairs: Vec<(String, String)> = group
            .iter()
            .filter(|kv| !kv.is_empty())
            .map(|kv| {
                let (key, value) = parse_assignment(kv);
                (key.to_string(), value.to_string())
            })
            .collect();
        if !pairs.is_empty() {
            cleaned.push(pairs);
        }
    }
    cleaned
}

/// Cartesian product over groups, one choice per group. No groups yields a
/// single empty selection, so callers always get at least one combination.
fn combinations(groups: &[Vec<(String, String)>]) -> Vec<Vec<(String, String)>> {
    let mut combos: Vec<Vec<(String, String)>> = vec![Vec::new()];
    for group in groups {
        let mut next = Vec::with_capacity(combos.len() * group.len());
        for combo in &combos {
            for choice in group {
                let mut extended = combo.clone();
                extended.push(choice.clone());
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

fn serialize(params: &IndexMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Expand one target assignment into every request body the combination grid
/// produces. Each body starts from the baseline packet, then the target, then
/// one choice per prerequisite group, then one choice per companion group,
/// later layers overwriting earlier values. Keys keep the baseline's order;
/// keys the baseline lacks are appended in the order they first appear.
/// Always returns at least one body.
pub fn expand(
    target: &str,
    prerequisites: &[Vec<String>],
    other_params: &[Vec<String>],
    baseline_packet: &str,
) -> Vec<String> {
    let baseline = parse_packet(baseline_packet);
    let (target_key, target_value) = parse_assignment(target);

    let prereq_combos = combinations(&clean_groups(prerequisites));
    let other_combos = combinations(&clean_groups(other_params));

    let mut bodies = Vec::with_capacity(prereq_combos.len() * other_combos.len());
    for prereq_combo in &prereq_combos {
        for other_combo in &other_combos {
            let mut params = baseline.clone();
            params.insert(target_key.to_string(), target_value.to_string());
            for (key, value) in prereq_combo {
                params.insert(key.clone(), value.clone());
            }
            for (key, value) in other_combo {
                params.insert(key.clone(), value.clone());
            }
            bodies.push(serialize(&params));
        }
    }
    bodies
}
