pub mod swipe;
