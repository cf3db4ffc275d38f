pub mod definitions;
pub mod eval;
pub mod parser;
pub mod subst;
pub mod term;
