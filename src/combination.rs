use std::collections::HashMap;

use crate::ranked_set::MAX_BLEND_SLOTS;
use crate::segmentation::CellWeighting;
use crate::terrain_type::TerrainType;

/// Dense id per unordered k-subset of terrain types, keyed by the product
/// of the subset's primes. Unique factorization makes the keying
/// collision-free, so the map is injective by construction. Built once per
/// terrain-type configuration and reused across segmentation calls; the
/// material system resolves a cell's blend set to a texture-array layer
/// through it.
pub struct CombinationIndexMap {
    subset_size: usize,
    indices: HashMap<u64, u32>,
}

impl CombinationIndexMap {
    /// Enumerates every `subset_size`-combination of `types` in
    /// lexicographic index order and records `prime product -> sequential
    /// index` the first time each product appears.
    pub fn build(types: &[TerrainType], subset_size: usize) -> Result<Self, String> {
        if subset_size == 0 || subset_size > MAX_BLEND_SLOTS {
            return Err(format!(
                "combination subset size {} outside [1, {}]",
                subset_size, MAX_BLEND_SLOTS
            ));
        }
        if subset_size > types.len() {
            return Err(format!(
                "combination subset size {} exceeds type count {}",
                subset_size,
                types.len()
            ));
        }

        let mut indices = HashMap::new();
        let mut next_index = 0u32;
        let mut picks: Vec<usize> = (0..subset_size).collect();

        loop {
            let product: u64 = picks.iter().map(|&i| types[i].prime).product();
            indices.entry(product).or_insert_with(|| {
                let index = next_index;
                next_index += 1;
                index
            });

            // Advance to the next combination in lexicographic order.
            let mut slot = subset_size;
            loop {
                if slot == 0 {
                    return Ok(Self {
                        subset_size,
                        indices,
                    });
                }
                slot -= 1;
                if picks[slot] != slot + types.len() - subset_size {
                    break;
                }
            }
            picks[slot] += 1;
            for i in slot + 1..subset_size {
                picks[i] = picks[i - 1] + 1;
            }
        }
    }

    pub fn subset_size(&self) -> usize {
        self.subset_size
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Lookup by prime product, as handed out by `prime_key`.
    pub fn index_of(&self, product: u64) -> Option<u32> {
        self.indices.get(&product).copied()
    }
}

/// Product of the primes assigned to a cell's surviving blend types. Order
/// never matters: multiplication commutes, which is the point of the
/// scheme.
pub fn prime_key(weighting: &CellWeighting, types: &[TerrainType]) -> Result<u64, String> {
    let mut product = 1u64;
    for slot in 0..weighting.slot_count() {
        let id = weighting.ids[slot] as usize;
        let ty = types
            .get(id)
            .ok_or_else(|| format!("weighting references type {} of {}", id, types.len()))?;
        product *= ty.prime;
    }
    Ok(product)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain_type::default_palette;

    fn palette_of(n: usize) -> Vec<TerrainType> {
        const PRIMES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
        PRIMES[..n]
            .iter()
            .map(|&p| TerrainType::new(&format!("type-{}", p), [0, 0, 0], p))
            .collect()
    }

    fn binomial(n: usize, k: usize) -> usize {
        if k > n {
            return 0;
        }
        (1..=k).fold(1, |acc, i| acc * (n - k + i) / i)
    }

    #[test]
    fn map_is_injective_for_all_small_configurations() {
        for n in 1..=12 {
            let types = palette_of(n);
            for k in 1..=4.min(n) {
                let map = CombinationIndexMap::build(&types, k).expect("valid arguments");
                assert_eq!(map.len(), binomial(n, k), "n={} k={}", n, k);
            }
        }
    }

    #[test]
    fn subset_larger_than_type_count_fails() {
        let types = palette_of(3);
        assert!(CombinationIndexMap::build(&types, 4).is_err());
    }

    #[test]
    fn subset_size_outside_range_fails() {
        let types = palette_of(6);
        assert!(CombinationIndexMap::build(&types, 0).is_err());
        assert!(CombinationIndexMap::build(&types, 5).is_err());
    }

    #[test]
    fn indices_are_dense_and_lexicographic() {
        let types = palette_of(4);
        let map = CombinationIndexMap::build(&types, 2).expect("valid arguments");
        // First combination (2, 3) takes index 0, last (5, 7) takes C(4,2)-1.
        assert_eq!(map.index_of(6), Some(0));
        assert_eq!(map.index_of(35), Some(5));
        assert_eq!(map.index_of(4), None);
    }

    #[test]
    fn prime_key_multiplies_surviving_slots() {
        let types = default_palette();
        let mut weighting = CellWeighting::default();
        weighting.ids[0] = 2;
        weighting.weights[0] = 0.7;
        weighting.ids[1] = 0;
        weighting.weights[1] = 0.3;
        let key = prime_key(&weighting, &types).expect("ids in range");
        assert_eq!(key, 5 * 2);
    }

    #[test]
    fn prime_key_rejects_unknown_type() {
        let types = default_palette();
        let mut weighting = CellWeighting::default();
        weighting.ids[0] = 9;
        weighting.weights[0] = 1.0;
        assert!(prime_key(&weighting, &types).is_err());
    }
}
