pub mod input_enumerator;
