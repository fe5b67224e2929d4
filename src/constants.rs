// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const FILENAME_TRUNCATE_LENGTH: usize = 65;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const DEFAULT_SAVE_DIR: &str = "downloads";
pub const DEFAULT_VIDEO_EXTENSION: &str = "mp4";
pub const DEFAULT_VARIANT: &str = "1:HD";
pub const DEFAULT_WORKERS: usize = 3;
pub const DEFAULT_LOGIN_TIMEOUT_SECS: u64 = 300;
pub const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;
pub const DIGEST_BUFFER_SIZE: usize = 8192;
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

pub const HELP_LOGIN_GUIDE: &str = r#"
1. 程序会打开一个 Chrome 窗口并跳转到 Echo360 登录页。
2. 在该窗口中手动完成登录 (包括学校的单点登录)。
3. 登录成功并进入课程列表页面后，程序会自动继续。
4. 请不要在程序运行期间操作该浏览器窗口。"#;

pub mod site {
    pub const BASE_URL: &str = "https://echo360.net.au";
    pub const COURSES_PATH: &str = "/courses";
    pub const LOGIN_PATH: &str = "/directLogin";
    pub const CONTENT_HOST_PREFIX: &str = "content.echo360.net.au";
}

pub mod network_log {
    pub const REQUEST_WILL_BE_SENT: &str = "Network.requestWillBeSent";
}
