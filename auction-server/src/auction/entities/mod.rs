mod ask;
mod bid;

pub use {
    ask::*,
    bid::*,
};
