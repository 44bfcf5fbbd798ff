extern crate image;
use std::{env, fs};
use std::path::PathBuf;
use image::{Rgba, RgbaImage};

const ICON_SIZE: u32 = 32;

fn out_dir() -> String {
    env::var("OUT_DIR").expect("No OUT_DIR env var")
}

// draws a wheel: a thick ring with a hub and four spokes
fn render_wheel_icon() -> RgbaImage {
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let tire = Rgba([40, 44, 52, 255]);
    let rim = Rgba([66, 135, 245, 255]);

    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let dx = x as f32 - center;
        let dy = y as f32 - center;
        let distance = (dx * dx + dy * dy).sqrt();

        if distance <= 15.5 && distance >= 12.0 {
            tire
        } else if distance <= 3.5 {
            rim
        } else if distance < 12.0 && (dx.abs() <= 1.0 || dy.abs() <= 1.0) {
            rim
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

fn build_window_icon() {
    let out_dir = out_dir();
    let out_path: PathBuf = [out_dir.as_str(), "icon-32-rgba"].iter().collect();

    let rgba = render_wheel_icon().into_raw();
    fs::write(&out_path, rgba).expect("Failed to write icon-32-rgba");
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    build_window_icon();
}
