mod common;
mod pricing;
