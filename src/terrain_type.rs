use serde::{Deserialize, Serialize};

/// Immutable descriptor for one terrain type. The shaping parameters drive
/// the height displacement applied by the mesh generator; the prime feeds
/// the combination index map and must be unique within a type list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainType {
    pub name: String,
    pub color: [u8; 3],
    pub noise_scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub height_offset: f32,
    pub prime: u64,
}

impl TerrainType {
    pub fn new(name: &str, color: [u8; 3], prime: u64) -> Self {
        Self {
            name: name.to_string(),
            color,
            noise_scale: 24.0,
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
            height_offset: 0.0,
            prime,
        }
    }
}

/// Four-type starter palette used by the preview binary and tests.
pub fn default_palette() -> Vec<TerrainType> {
    vec![
        TerrainType::new("water", [30, 90, 180], 2),
        TerrainType::new("sand", [216, 200, 160], 3),
        TerrainType::new("grass", [100, 176, 80], 5),
        TerrainType::new("rock", [130, 130, 130], 7),
    ]
}

/// Checks the contract the combination map relies on: every type carries a
/// genuine prime, and no prime is shared between two types in the list.
pub fn validate_types(types: &[TerrainType]) -> Result<(), String> {
    if types.is_empty() {
        return Err("terrain type list is empty".to_string());
    }
    for (index, ty) in types.iter().enumerate() {
        if !is_prime(ty.prime) {
            return Err(format!(
                "terrain type {:?} (index {}) has non-prime id {}",
                ty.name, index, ty.prime
            ));
        }
        if let Some(other) = types[..index].iter().find(|o| o.prime == ty.prime) {
            return Err(format!(
                "terrain types {:?} and {:?} share prime id {}",
                other.name, ty.name, ty.prime
            ));
        }
    }
    Ok(())
}

fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_palette_passes_validation() {
        validate_types(&default_palette()).expect("palette should be valid");
    }

    #[test]
    fn rejects_non_prime_id() {
        let mut types = default_palette();
        types[1].prime = 9;
        assert!(validate_types(&types).is_err());
    }

    #[test]
    fn rejects_reused_prime() {
        let mut types = default_palette();
        types[3].prime = 2;
        assert!(validate_types(&types).is_err());
    }

    #[test]
    fn rejects_empty_list() {
        assert!(validate_types(&[]).is_err());
    }
}
