use crate::core::config::data::{path_display, Config};

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        println!("  bind: {}", self.bind_addr());
        println!("  default-backend: {}", self.default_backend());
        match &self.data_dir {
            Some(dir) => println!("  data-dir: {}", path_display(dir)),
            None => println!("  data-dir: (default)"),
        }
        let retry = self.retry_policy();
        println!(
            "  retry: {} retries, {}ms apart",
            retry.max_retries,
            retry.delay.as_millis()
        );
        println!("  typing-interval: {}ms", self.typing_interval().as_millis());
        match self.syntax_enabled() {
            true => println!("  syntax: on"),
            false => println!("  syntax: off"),
        }
        println!("  speech-command: {}", self.speech_command());
        let mut overrides: Vec<_> = self
            .backends
            .iter()
            .filter_map(|(id, o)| o.base_url.as_ref().map(|url| (id, url)))
            .collect();
        overrides.sort();
        for (id, url) in overrides {
            println!("  {id}.base-url: {url}");
        }
    }
}
