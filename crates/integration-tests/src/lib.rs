//! Shared fixtures for the end-to-end tests: recording ports and a composer
//! wired with the real markup and raster plugins.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use nb_core::{
    ComposerPorts, ComposerSettings, DataUri, Dialog, Navigator, NoticeApi, NoticeComposer,
    NoticeError, NoticeItem, NoticeNo, NoticePayload, Result, Route,
};
use nb_markup_regex::RegexMarkupParser;
use nb_raster_image::ImageRasterSurface;

/// A PNG of the given size as a `data:image/png;base64,...` string.
pub fn png_data_uri(width: u32, height: u32) -> String {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 251) as u8, (y % 241) as u8, 90, 255])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode fixture png");
    DataUri::from_bytes("image/png", &out.into_inner()).to_string()
}

/// Dimensions of a base64 PNG body as sent in `file`.
pub fn file_dimensions(file: &str) -> (u32, u32) {
    let bytes = DataUri::parse(&format!("data:image/png;base64,{}", file))
        .and_then(|uri| uri.decode_bytes())
        .expect("file is base64");
    let img = image::load_from_memory_with_format(&bytes, ImageFormat::Png).expect("file is a png");
    (img.width(), img.height())
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub routes: Mutex<Vec<Route>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

pub struct ScriptedDialog {
    accept: bool,
    pub alerts: Mutex<Vec<String>>,
    pub confirms: Mutex<Vec<String>>,
}

impl ScriptedDialog {
    pub fn answering(accept: bool) -> Self {
        Self {
            accept,
            alerts: Mutex::new(Vec::new()),
            confirms: Mutex::new(Vec::new()),
        }
    }
}

impl Dialog for ScriptedDialog {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        self.confirms.lock().unwrap().push(message.to_string());
        self.accept
    }
}

/// Keeps every payload it receives and answers with a fixed notice number.
pub struct CapturingApi {
    notice_no: String,
    pub payloads: Mutex<Vec<NoticePayload>>,
}

impl CapturingApi {
    pub fn answering(notice_no: &str) -> Self {
        Self {
            notice_no: notice_no.to_string(),
            payloads: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl NoticeApi for CapturingApi {
    async fn insert_notice(&self, payload: &NoticePayload) -> Result<NoticeNo> {
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(NoticeNo::new(self.notice_no.clone()))
    }

    async fn list_notices(&self) -> Result<Vec<NoticeItem>> {
        Ok(Vec::new())
    }

    async fn get_notice(&self, no: &NoticeNo) -> Result<NoticeItem> {
        Err(NoticeError::NotFound(no.to_string()))
    }
}

pub struct Form {
    pub composer: NoticeComposer,
    pub navigator: Arc<RecordingNavigator>,
    pub dialog: Arc<ScriptedDialog>,
}

/// A composer using the regex markup parser and the image-rs raster surface.
pub fn form(api: Arc<dyn NoticeApi>, accept_confirm: bool) -> Form {
    form_with_decode_timeout(api, accept_confirm, Duration::from_secs(10))
}

pub fn form_with_decode_timeout(
    api: Arc<dyn NoticeApi>,
    accept_confirm: bool,
    decode_timeout: Duration,
) -> Form {
    let navigator = Arc::new(RecordingNavigator::default());
    let dialog = Arc::new(ScriptedDialog::answering(accept_confirm));
    let ports = ComposerPorts {
        api,
        markup: Arc::new(RegexMarkupParser::new()),
        raster: Arc::new(ImageRasterSurface::new(decode_timeout, false)),
        navigator: navigator.clone(),
        dialog: dialog.clone(),
    };
    Form {
        composer: NoticeComposer::new(ports, ComposerSettings::default()),
        navigator,
        dialog,
    }
}
