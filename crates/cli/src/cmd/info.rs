use envpin_lib::config::Settings;
use envpin_lib::platform::{platform_triple, rust_host};

use crate::output::print_stat;

pub fn cmd_info() {
  println!("System:");
  match (platform_triple(), rust_host()) {
    (Some(triple), Some(host)) => {
      print_stat("Platform", &triple);
      print_stat("Rust host", &host);
    }
    _ => println!("Could not detect platform."),
  }

  let settings = Settings::from_env();
  println!();
  println!("Settings:");
  print_stat("Store", &settings.store_dir.display().to_string());
  print_stat("Toolchains", &settings.toolchains_dir.display().to_string());
  print_stat("Dist server", &settings.dist_server);
  if let Some(roots) = &settings.index_roots {
    let roots: Vec<String> = roots.iter().map(|r| r.display().to_string()).collect();
    print_stat("Index", &roots.join(":"));
  }
  print_stat("rustup", if settings.use_rustup { "enabled" } else { "disabled" });
}
