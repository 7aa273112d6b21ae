use crate::detected::StrategyType;
use crate::strategies::{
  ComplexGraphStrategy, ExecutionStrategy, ParallelStrategy, PartiallyParallelStrategy,
  SequentialStrategy,
};

/// Maps a strategy type to the strategy that drives it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrategyFactory;

impl StrategyFactory {
  pub fn create(strategy_type: StrategyType) -> Box<dyn ExecutionStrategy> {
    match strategy_type {
      StrategyType::Sequential => Box::new(SequentialStrategy),
      StrategyType::Parallel => Box::new(ParallelStrategy),
      StrategyType::PartiallyParallel => Box::new(PartiallyParallelStrategy),
      StrategyType::ComplexGraph => Box::new(ComplexGraphStrategy),
    }
  }
}
