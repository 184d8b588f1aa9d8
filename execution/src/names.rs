use cardscore_types::THEMED_NAMES;
use rand::{seq::SliceRandom, Rng};

/// Picks `count` display names from [THEMED_NAMES].
///
/// The first `min(count, 10)` names are distinct, in random order. Any names
/// past the end of the list are repeated picks.
pub fn themed_names<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<String> {
    let mut shuffled = THEMED_NAMES;
    shuffled.shuffle(rng);

    let mut names: Vec<String> = shuffled
        .iter()
        .take(count)
        .map(|name| name.to_string())
        .collect();
    while names.len() < count {
        let Some(name) = shuffled.choose(rng) else {
            break;
        };
        names.push(name.to_string());
    }
    names
}
