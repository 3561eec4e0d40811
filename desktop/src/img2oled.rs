use std::path::Path;

use argh::FromArgs;
use embedded_graphics::prelude::Size;
use log::error;
use oledconv_core::{
    framebuffer::{HEIGHT, WIDTH},
    listing::{DEFAULT_LINE_WIDTH, array_name_for},
};

use crate::convert::Options;

mod convert;
mod std_fs;

#[derive(FromArgs)]
/// Convert an image into SSD1306 page-addressed display memory.
/// If no output file is given the listing is printed to standard out.
struct Args {
    /// input image path
    #[argh(positional)]
    input_path: String,

    /// output text file path
    #[argh(positional)]
    output_path: Option<String>,

    /// expected image width
    #[argh(option, default = "WIDTH as u32")]
    width: u32,

    /// expected image height
    #[argh(option, default = "HEIGHT as u32")]
    height: u32,

    /// accept images of any size
    #[argh(switch)]
    any_size: bool,

    /// print a bare hex listing instead of a C array
    #[argh(switch, short = 'p')]
    plain: bool,

    /// array name, defaults to the input file name
    #[argh(option, short = 'n')]
    name: Option<String>,

    /// maximum characters per line
    #[argh(option, default = "DEFAULT_LINE_WIDTH")]
    line_width: usize,
}

impl Args {
    fn options(&self) -> Options {
        let expected_size = if self.any_size {
            None
        } else {
            Some(Size::new(self.width, self.height))
        };
        let array_name = if self.plain {
            None
        } else {
            Some(
                self.name
                    .clone()
                    .unwrap_or_else(|| array_name_for(&self.input_path)),
            )
        };
        Options {
            expected_size,
            array_name,
            line_width: self.line_width,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    let options = args.options();

    let input = Path::new(&args.input_path);
    let output = args.output_path.as_deref().map(Path::new);
    if let Err(err) = convert::run(input, output, &options) {
        error!("{err}");
        std::process::exit(1);
    }
}
