mod common;
mod refiner;
mod routing;
