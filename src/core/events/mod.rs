pub mod injectors;
