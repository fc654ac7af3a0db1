// Copyright 2026 Poison contributors
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use poison::{MemoryStorage, NamedRoutes, Renderer, ViewConfig};
use serde_json::json;
use std::error::Error;
use std::fs;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    // This example demonstrates two approaches:
    // 1. Views kept in memory (MemoryStorage)
    // 2. Views read from and compiled to the filesystem

    println!("=== Memory Storage Example ===");
    memory_example()?;

    println!("\n=== Filesystem Example ===");
    filesystem_example()?;

    Ok(())
}

fn memory_example() -> Result<(), Box<dyn Error>> {
    let storage = MemoryStorage::new();
    let ext = ".poison.html";

    storage.add_view("views", "layouts.app", ext, r#"<!DOCTYPE html>
<html>
<head>
    <title>{{ app }} | {{ title }}</title>
</head>
<body>
    <nav>@include('partials.nav', { active = title })</nav>
    {{ content }}
</body>
</html>"#);

    storage.add_view("views", "partials.nav", ext, r#"<a href="@url('home')">Home</a> ({{ active }})"#);

    storage.add_view("views", "posts.index", ext, r#"@extend('layouts.app', { title = 'Posts' })
@content
    <ul>
    @foreach(post in posts)
        <li>
            <a href="@url('posts.show', { id = post.id })">{{ post.title }}</a>
            @if(post.draft) <em>draft</em> @endif
        </li>
    @endforeach
    </ul>
@endcontent"#);

    let config = ViewConfig::default()
        .with_views_root("views")
        .with_cache_root("cache");
    let renderer = Renderer::new(config, storage.clone())?;
    renderer.add_global("app", "Poison Blog")?;
    renderer.set_url_resolver(
        NamedRoutes::new()
            .with("home", "/")
            .with("posts.show", "posts/:id"),
    );

    let html = renderer.render(
        "posts.index",
        json!({
            "posts": [
                { "id": 1, "title": "Hello, world", "draft": false },
                { "id": 2, "title": "Layouts with @extend", "draft": true }
            ]
        }),
    )?;
    println!("{}", html);

    println!("\nCompiled artifacts in memory: {}", storage.count_in(Path::new("cache")));
    if let Some(code) = renderer.artifact_source("partials.nav")? {
        println!("\nLua for partials.nav:\n{}", code);
    }

    Ok(())
}

fn filesystem_example() -> Result<(), Box<dyn Error>> {
    let base = std::env::temp_dir().join("poison-demo");
    let config = ViewConfig::for_base(&base);
    fs::create_dir_all(&config.views_root)?;

    println!("View directory: {}", config.views_root.display());
    println!("NOTE: Delete {} when done with the example.", base.display());

    fs::write(
        config.views_root.join("welcome.poison.html"),
        "<h1>Welcome, {{ user.name }}!</h1>\n@if(user.admin)<p>You are an administrator.</p>@endif\n",
    )?;
    fs::write(
        config.views_root.join("static.poison.html"),
        "<p>No directives here, so nothing is compiled.</p>\n",
    )?;

    let renderer = Renderer::with_filesystem(config.clone())?;

    let mut stdout = std::io::stdout();
    renderer.render_to("welcome", json!({ "user": { "name": "Ada", "admin": true } }), &mut stdout)?;
    renderer.render_to("static", (), &mut stdout)?;

    println!("Cleared {} compiled view(s) from {}", renderer.clear_cache()?, config.cache_root.display());
    Ok(())
}
