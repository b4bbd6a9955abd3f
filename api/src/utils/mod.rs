pub mod web_utils;
