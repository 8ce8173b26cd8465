const FORWARDED_ENV: [&str; 3] = ["WIFI_SSID", "WIFI_PASS", "STATION_VARIANT"];

fn main() {
    println!("cargo:rerun-if-changed=.env");
    for key in FORWARDED_ENV {
        println!("cargo:rerun-if-env-changed={key}");
    }

    // Station credentials and variant may come from a local `.env` file.
    // Values already present in the environment win over the file.
    if let Ok(path) = dotenvy::dotenv() {
        println!("cargo:warning=station config loaded from {}", path.display());
    }
    for key in FORWARDED_ENV {
        if let Ok(value) = std::env::var(key) {
            println!("cargo:rustc-env={key}={value}");
        }
    }

    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
