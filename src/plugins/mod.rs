pub mod game_plugin;
pub mod modifier_plugin;
pub mod options_plugin;
pub mod ui_plugin;
