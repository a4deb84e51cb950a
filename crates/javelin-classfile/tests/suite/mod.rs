mod builder;
mod indexing;
mod type_paths;
