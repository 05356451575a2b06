pub mod codec {
    pub mod error;
    pub mod font;
    pub mod glyf;
    pub mod reader;
    pub mod sfnt;
    pub mod woff;
    pub mod woff2;
}

pub mod service {
    pub mod config_service;
    pub mod conversion_service;
    pub mod conversion_worker;
    pub mod font_service;
    pub mod traits {
        pub mod i_service;
    }
}

pub mod config {
    pub mod config;
    pub mod ports;
}

pub mod models {
    pub mod conversion;
    pub mod event;
}

pub mod facade {
    pub mod conversion_facade;
    pub mod traits {
        pub mod i_conversion;
    }
}

pub mod action {
    pub mod app;
    pub mod interactive;
}

pub mod utils {
    pub mod file;
    pub mod utils;
}
