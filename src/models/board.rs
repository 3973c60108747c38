use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Serialize, Serializer};

// Define the size of the board
const SIZE: usize = 6;
const CELLS: usize = SIZE * SIZE;
const VOWEL_DRAWS: usize = 12;
const CONSONANT_DRAWS: usize = CELLS - VOWEL_DRAWS;

// Letter pools; repeats set the draw weights
const VOWELS: &str = "AAAAAAEEEEEEEEIIIIIOOOOOUUU";
const CONSONANTS: &str =
    "BBCCCDDDDFFGGGHHHJKLLLLLMMMNNNNNNPPQRRRRRRSSSSSSTTTTTTTVVWWXYYZ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Vec<char>,
}

impl Board {
    // Generate a new board
    pub fn new() -> Self {
        Self::with_rng(&mut rand::thread_rng())
    }

    pub fn with_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let vowels: Vec<char> = VOWELS.chars().collect();
        let consonants: Vec<char> = CONSONANTS.chars().collect();

        let mut cells = Vec::with_capacity(CELLS);
        for (pool, draws) in [(&vowels, VOWEL_DRAWS), (&consonants, CONSONANT_DRAWS)] {
            for _ in 0..draws {
                if let Some(letter) = pool.choose(rng) {
                    cells.push(*letter);
                }
            }
        }
        cells.shuffle(rng);

        Board { cells }
    }

    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    pub fn as_string(&self) -> String {
        self.cells.iter().collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Board {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn board_has_36_cells_split_12_24() {
        for seed in 0..50 {
            let board = Board::with_rng(&mut StdRng::seed_from_u64(seed));
            assert_eq!(board.cells().len(), CELLS);
            assert_eq!(board.as_string().len(), 36);

            let vowels = board.cells().iter().filter(|c| VOWELS.contains(**c)).count();
            let consonants = board
                .cells()
                .iter()
                .filter(|c| CONSONANTS.contains(**c))
                .count();
            assert_eq!(vowels, VOWEL_DRAWS);
            assert_eq!(consonants, CONSONANT_DRAWS);
        }
    }

    #[test]
    fn serializes_as_flat_string() {
        let board = Board::new();
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, format!("\"{}\"", board.as_string()));
    }
}
