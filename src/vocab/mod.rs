// vocab/: Flat-file inputs: the ground-truth item list and the synonym dictionary.

pub mod ground_truth;
pub mod synonyms;

pub use ground_truth::load_ground_truth;
pub use synonyms::SynonymDictionary;
