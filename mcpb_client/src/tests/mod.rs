mod tools;
mod world;
