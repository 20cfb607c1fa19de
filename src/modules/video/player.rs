/// Conventional public location of a video's top-level manifest.
pub fn manifest_url(public_domain: &str, slug: &str) -> String {
    format!("{public_domain}/videos/{slug}/master.m3u8")
}

/// Self-contained embed page for iframe usage: hls.js feeds the manifest to
/// the video element, Plyr provides the control surface. Pure presentation,
/// no state of its own.
pub fn embed_page(manifest_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <style>body{{margin:0;background:#000;overflow:hidden;}}video{{width:100vw;height:100vh;}}</style>
    <script src="https://cdn.jsdelivr.net/npm/hls.js@1"></script>
    <script src="https://cdn.plyr.io/3.8.3/plyr.js"></script>
    <link rel="stylesheet" href="https://cdn.plyr.io/3.8.3/plyr.css" />
</head>
<body>
    <video id="player" controls crossorigin playsinline></video>
    <script>
        const source = "{manifest_url}";
        const video = document.getElementById('player');
        const defaultOptions = {{ controls: ['play-large', 'play', 'progress', 'current-time', 'mute', 'volume', 'settings', 'fullscreen'] }};

        if (Hls.isSupported()) {{
            const hls = new Hls();
            hls.loadSource(source);
            hls.attachMedia(video);
            window.player = new Plyr(video, defaultOptions);
        }} else {{
            video.src = source;
            window.player = new Plyr(video, defaultOptions);
        }}
    </script>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_url_follows_the_static_prefix_convention() {
        assert_eq!(
            manifest_url("https://vps.example.com", "abc123de"),
            "https://vps.example.com/videos/abc123de/master.m3u8"
        );
    }

    #[test]
    fn embed_page_wires_the_manifest_into_the_player() {
        let url = "https://vps.example.com/videos/abc123de/master.m3u8";
        let html = embed_page(url);
        assert!(html.contains(&format!("const source = \"{url}\"")));
        assert!(html.contains("<video id=\"player\""));
        assert!(html.contains("hls.js"));
    }
}
