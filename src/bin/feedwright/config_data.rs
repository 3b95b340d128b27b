use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

const CONFIG_SAMPLE: &str = r#"[site]
url = "https://example.com"
title = "My site"
description = "Articles about things"
language = "en"

[author]
name = "{{USER}}"
email = "me@example.com"

# For the file locations, If you want it to be relative to the executable directory
# use ${exe_dir}/location
[paths]
content_dir = "src/articles"
output_dir = "public"

# Default file name if using directory instead of files
[defaults]
index_base_name = "index"
include_drafts = false
item_limit = 20

[log]
level = "Info"
log_to_console = true
"#;

pub(crate) fn write_sample_cfg(file_path: &Path) -> io::Result<()> {
    let mut file = File::create(file_path)?;
    file.write_all(get_sample_cfg().as_bytes())
}

fn get_sample_cfg() -> String {
    let mut user = whoami::realname();
    if user.trim().is_empty() {
        user = whoami::username();
    }
    let user = user.replace(['"', '\\'], "");
    CONFIG_SAMPLE.replace("{{USER}}", &user)
}
