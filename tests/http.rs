use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mandeltile::client::{base_url, ClientError};
use mandeltile::{
    c, http_service, render, Dimension, GreyscalePainter, HttpTileService, Region,
    RenderConfig, TileService,
};

/// Serves `connections` requests on a loopback port, one connection each,
/// answering with `handler(path)`. Returns the base url and the requested
/// paths once the server thread is done.
fn serve<F>(connections: usize, handler: F) -> (String, thread::JoinHandle<Vec<String>>)
where
    F: Fn(&str) -> (u16, String) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut paths = vec![];
        for _ in 0..connections {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let path = request_line
                .split_whitespace()
                .nth(1)
                .unwrap_or_default()
                .to_string();
            loop {
                let mut line = String::new();
                let n = reader.read_line(&mut line).unwrap();
                if n == 0 || line == "\r\n" {
                    break;
                }
            }

            let (status, body) = handler(&path);
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            stream.flush().unwrap();
            paths.push(path);
        }
        paths
    });
    (format!("http://{}/api", addr), handle)
}

/// Fills a part with its own width, read back from the request path.
fn width_pixels(path: &str) -> (u16, String) {
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
    // api / mandelbrot / min_re / min_im / max_re / max_im / width / height / steps
    let width: usize = segments[6].parse().unwrap();
    let height: usize = segments[7].parse().unwrap();
    let pixels = vec![width.to_string(); width * height].join(",");
    (200, format!("{{\"pixels\":[{}]}}", pixels))
}

fn service(base: &str) -> HttpTileService {
    HttpTileService::new(base_url(base).unwrap(), Duration::from_secs(5)).unwrap()
}

#[test]
fn computes_one_region_over_http() {
    let (base, server) = serve(1, width_pixels);
    let region =
        Region::create(Dimension::new(4, 3), c(-2.0, -1.0), c(0.5, 1.0), 100).unwrap();

    let pixels = service(&base).compute(&region).unwrap();
    assert_eq!(pixels, vec![4; 12]);

    let paths = server.join().unwrap();
    assert_eq!(paths, vec!["/api/mandelbrot/-2/-1/0.5/1/4/3/100".to_string()]);
}

#[test]
fn non_success_status_is_an_error() {
    let (base, server) = serve(1, |_| (503, "{}".to_string()));
    let region = Region::create(Dimension::new(2, 2), c(-1.0, -1.0), c(1.0, 1.0), 10).unwrap();

    let err = service(&base).compute(&region).unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 503, .. }));
    server.join().unwrap();
}

#[test]
fn malformed_body_is_an_error() {
    let (base, server) = serve(1, |_| (200, "{\"pix\": 1}".to_string()));
    let region = Region::create(Dimension::new(2, 2), c(-1.0, -1.0), c(1.0, 1.0), 10).unwrap();

    let err = service(&base).compute(&region).unwrap_err();
    assert!(matches!(err, ClientError::Decode { .. }));
    server.join().unwrap();
}

#[test]
fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    drop(listener);
    let region = Region::create(Dimension::new(2, 2), c(-1.0, -1.0), c(1.0, 1.0), 10).unwrap();

    let err = service(&base).compute(&region).unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }));
}

#[test]
fn renders_through_http_service() {
    let (base, server) = serve(4, width_pixels);
    let config = RenderConfig {
        min_c: c(-2.0, -2.0),
        max_c: c(2.0, 2.0),
        width: 30,
        height: 30,
        tile_edge: 20,
        concurrency: 2,
        server_url: base,
        ..Default::default()
    };

    let service: Arc<dyn TileService> = http_service(&config).unwrap();
    let mut png = Vec::new();
    let summary = render(&config, service, GreyscalePainter, &mut png).unwrap();
    assert_eq!(summary.parts, 4);

    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (30, 30));
    assert_eq!(img.get_pixel(0, 0).0, [20, 20, 20, 255]);
    assert_eq!(img.get_pixel(25, 0).0, [10, 10, 10, 255]);
    assert_eq!(img.get_pixel(0, 25).0, [20, 20, 20, 255]);
    assert_eq!(img.get_pixel(29, 29).0, [10, 10, 10, 255]);

    // Each part carries its own width and height
    let paths = server.join().unwrap();
    for size in ["/20/20/1024", "/10/20/1024", "/20/10/1024", "/10/10/1024"] {
        assert_eq!(
            paths.iter().filter(|p| p.ends_with(size)).count(),
            1,
            "{} in {:?}",
            size,
            paths
        );
    }
}
