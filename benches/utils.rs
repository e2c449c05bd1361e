use rand::{Rng, SeedableRng, rngs::StdRng};
use serde_json::{Value, json};

/// Partial shared by every engine's profile template.
pub const FOOTER: &str = "<footer>Generated for {{user.name}} in {{year}}</footer>";

/// Generate n random profile contexts. The seed is fixed so every engine
/// renders the same data.
pub fn generate_random_contexts(n: usize) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(42);

    (0..n)
        .map(|_| {
            let items: Vec<Value> = (0..rng.random_range(3..10))
                .map(|_| {
                    json!({
                        "name": random_string(&mut rng, 3, 8),
                        "value": rng.random_range(10..1000),
                        "special": rng.random_bool(0.3),
                    })
                })
                .collect();

            json!({
                "user": {
                    "name": random_string(&mut rng, 5, 10),
                    "age": rng.random_range(18..80),
                    "active": rng.random_bool(0.7),
                },
                "items": items,
                "show_details": rng.random_bool(0.8),
                "has_access": rng.random_bool(0.6),
            })
        })
        .collect()
}

/// Generate a random lowercase string with length between min and max
fn random_string(rng: &mut StdRng, min_len: usize, max_len: usize) -> String {
    let len = rng.random_range(min_len..=max_len);
    (0..len)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect()
}
