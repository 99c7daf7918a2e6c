use std::net::TcpListener;
use std::time::Duration;

use flowreplay_browser::testing::{BrowserCall, ScriptedLauncher};
use flowreplay_browser::{
    BrowserError, BrowserLauncher, BrowserSession, LaunchOptions, PagePoint, WebDriverConfig,
    WebDriverLauncher,
};

fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn unreachable_server_fails_launch() {
    let config = WebDriverConfig {
        server_url: format!("http://127.0.0.1:{}", unused_port()),
        driver_binary: None,
        request_timeout: Duration::from_secs(2),
        ..WebDriverConfig::default()
    };
    let launcher = WebDriverLauncher::new(config);

    match launcher.launch(&LaunchOptions::default()) {
        Err(BrowserError::Launch(_)) => {}
        Err(other) => panic!("expected a launch error, got {other}"),
        Ok(_) => panic!("launch against a closed port succeeded"),
    }
}

#[test]
fn session_drives_and_closes_scripted_browser() {
    let launcher = ScriptedLauncher::new(1024, 3000);
    let log = launcher.log();

    let mut session = BrowserSession::launch(&launcher, &LaunchOptions::default()).unwrap();
    {
        let browser = session.controller().unwrap();
        browser.navigate("https://shop.test/cart").unwrap();
        let page = browser.page_dimensions().unwrap();
        let target = page.clamp(2000, 10);
        browser
            .pointer_move(PagePoint::default().delta_to(target), target)
            .unwrap();
        browser.scroll_to(450.0).unwrap();
        assert!(browser.capture_frame().unwrap().is_usable());
    }
    session.close().unwrap();

    assert_eq!(
        log.calls(),
        vec![
            BrowserCall::Launch,
            BrowserCall::Navigate("https://shop.test/cart".into()),
            BrowserCall::PageDimensions,
            BrowserCall::PointerMove {
                delta: (1023, 10),
                at: PagePoint::new(1023, 10),
            },
            BrowserCall::ScrollTo(450.0),
            BrowserCall::Capture,
            BrowserCall::Close,
        ]
    );
}
