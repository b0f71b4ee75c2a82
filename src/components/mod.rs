pub mod results_map;
