pub mod info_panel;
pub mod layer_controls;
pub mod map_view;
pub mod prediction_panel;
