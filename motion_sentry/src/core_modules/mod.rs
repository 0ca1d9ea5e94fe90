pub mod annotate;
pub mod background_model;
pub mod detection_tracker;
pub mod event_log;
pub mod frame;
pub mod mask_cleaner;
pub mod mixture_model;
pub mod region;
pub mod region_extractor;
pub mod region_filter;
pub mod running_average;
