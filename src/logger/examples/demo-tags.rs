// Copyright 2021 Twitter, Inc.
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use taglog::*;

fn main() {
    let logger = LoggerBuilder::new()
        .tag("request")
        .directory("log", MB, 4)
        .queue_depth(1024)
        .build()
        .expect("failed to initialize logger");

    logger
        .register_hook(Level::Error, |tag, msg| eprint!("alert from {}: {}", tag, msg))
        .expect("failed to register hook");

    let logger = logger.start().expect("failed to install logger");

    log::error!("error");
    log::warn!("warning");
    log::info!("info");
    log::debug!("debug");

    for i in 0..10_000 {
        infof!(logger, tag: "request", "ip:127.0.0.1 method:GET id:{}", i);
    }

    logger.flush().expect("failed to flush logger");
}
