//! Deterministic scaffold files included in every generated version.
//!
//! These never come from the model: build manifests, the Tailwind theme
//! derived from the design tokens, global styles, and a serialized copy of the
//! design system that edits and the preview read back.

use serde_json::{Map, Value, json};
use sitegen_core::design::DesignSystem;
use sitegen_core::files::{DESIGN_SYSTEM_PATH, GLOBALS_CSS_PATH, VirtualFile, pascal_case};
use sitegen_core::site::GenerationConfig;
use std::fmt::Write;

pub const PACKAGE_JSON_PATH: &str = "package.json";
pub const TAILWIND_CONFIG_PATH: &str = "tailwind.config.ts";
pub const TSCONFIG_PATH: &str = "tsconfig.json";
pub const POSTCSS_CONFIG_PATH: &str = "postcss.config.js";
pub const NEXT_CONFIG_PATH: &str = "next.config.js";

const POSTCSS_CONFIG: &str = "module.exports = {\n  plugins: {\n    tailwindcss: {},\n    autoprefixer: {},\n  },\n};\n";

const NEXT_CONFIG: &str = "/** @type {import('next').NextConfig} */\nconst nextConfig = {\n  images: {\n    remotePatterns: [{ protocol: 'https', hostname: '**' }],\n  },\n};\n\nmodule.exports = nextConfig;\n";

/// Paths every scaffold contains, in emission order.
pub const SCAFFOLD_PATHS: [&str; 7] = [
    PACKAGE_JSON_PATH,
    TSCONFIG_PATH,
    TAILWIND_CONFIG_PATH,
    POSTCSS_CONFIG_PATH,
    NEXT_CONFIG_PATH,
    GLOBALS_CSS_PATH,
    DESIGN_SYSTEM_PATH,
];

/// Build the scaffold for a project.
pub fn scaffold_files(
    config: &GenerationConfig,
    design: &DesignSystem,
) -> Result<Vec<VirtualFile>, serde_json::Error> {
    Ok(vec![
        VirtualFile::new(PACKAGE_JSON_PATH, package_json(config)?),
        VirtualFile::new(TSCONFIG_PATH, tsconfig()?),
        VirtualFile::new(TAILWIND_CONFIG_PATH, tailwind_config(design)?),
        VirtualFile::new(POSTCSS_CONFIG_PATH, POSTCSS_CONFIG),
        VirtualFile::new(NEXT_CONFIG_PATH, NEXT_CONFIG),
        VirtualFile::new(GLOBALS_CSS_PATH, globals_css(design)),
        VirtualFile::new(DESIGN_SYSTEM_PATH, serde_json::to_string_pretty(design)?),
    ])
}

/// npm package name from the business name: lowercase, dash-separated.
fn package_name(business_name: &str) -> String {
    let name: Vec<String> = business_name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if name.is_empty() {
        "generated-site".to_string()
    } else {
        name.join("-")
    }
}

fn package_json(config: &GenerationConfig) -> Result<String, serde_json::Error> {
    let manifest = json!({
        "name": package_name(&config.business_name),
        "version": "0.1.0",
        "private": true,
        "scripts": {
            "dev": "next dev",
            "build": "next build",
            "start": "next start",
            "lint": "next lint"
        },
        "dependencies": {
            "next": "14.2.5",
            "react": "^18.3.1",
            "react-dom": "^18.3.1",
            "lucide-react": "^0.408.0",
            "framer-motion": "^11.3.8",
            "clsx": "^2.1.1",
            "tailwind-merge": "^2.4.0"
        },
        "devDependencies": {
            "typescript": "^5.5.3",
            "@types/node": "^20.14.11",
            "@types/react": "^18.3.3",
            "@types/react-dom": "^18.3.0",
            "tailwindcss": "^3.4.6",
            "postcss": "^8.4.39",
            "autoprefixer": "^10.4.19"
        }
    });
    serde_json::to_string_pretty(&manifest)
}

fn tsconfig() -> Result<String, serde_json::Error> {
    let config = json!({
        "compilerOptions": {
            "target": "es2017",
            "lib": ["dom", "dom.iterable", "esnext"],
            "allowJs": true,
            "skipLibCheck": true,
            "strict": true,
            "noEmit": true,
            "esModuleInterop": true,
            "module": "esnext",
            "moduleResolution": "bundler",
            "resolveJsonModule": true,
            "isolatedModules": true,
            "jsx": "preserve",
            "incremental": true,
            "plugins": [{ "name": "next" }],
            "paths": { "@/*": ["./src/*"] }
        },
        "include": ["next-env.d.ts", "**/*.ts", "**/*.tsx", ".next/types/**/*.ts"],
        "exclude": ["node_modules"]
    });
    serde_json::to_string_pretty(&config)
}

/// Tailwind `theme.extend` derived from the tokens.
pub fn theme_extend(design: &DesignSystem) -> Value {
    let colors: Map<String, Value> = design
        .colors
        .groups()
        .into_iter()
        .map(|(name, scale)| (name.to_string(), json!(scale)))
        .collect();

    let mut keyframes = Map::new();
    let mut animation = Map::new();
    for (name, spec) in &design.animations {
        keyframes.insert(name.clone(), json!(spec.keyframes));
        animation.insert(
            name.clone(),
            Value::String(format!("{} {} {} both", name, spec.duration, spec.easing)),
        );
    }

    let fonts = &design.typography.font_families;
    let mut extend = json!({
        "colors": colors,
        "fontFamily": {
            "heading": [fonts.heading, "sans-serif"],
            "body": [fonts.body, "sans-serif"]
        }
    });
    for (key, map) in [
        ("spacing", &design.spacing),
        ("borderRadius", &design.border_radius),
        ("boxShadow", &design.shadows),
    ] {
        if !map.is_empty() {
            extend[key] = json!(map);
        }
    }
    if !keyframes.is_empty() {
        extend["keyframes"] = Value::Object(keyframes);
        extend["animation"] = Value::Object(animation);
    }
    extend
}

fn tailwind_config(design: &DesignSystem) -> Result<String, serde_json::Error> {
    let extend = serde_json::to_string_pretty(&theme_extend(design))?;
    Ok(format!(
        "import type {{ Config }} from 'tailwindcss';\n\n\
         const config: Config = {{\n  \
           content: ['./src/**/*.{{js,ts,jsx,tsx,mdx}}'],\n  \
           theme: {{\n    extend: {},\n  }},\n  \
           plugins: [],\n\
         }};\n\n\
         export default config;\n",
        extend.replace('\n', "\n    ")
    ))
}

fn globals_css(design: &DesignSystem) -> String {
    let mut css = String::from("@tailwind base;\n@tailwind components;\n@tailwind utilities;\n\n:root {\n");
    for (group, scale) in design.colors.groups() {
        for (shade, color) in scale {
            let _ = writeln!(css, "  --color-{}-{}: {};", group, shade, color);
        }
    }
    let fonts = &design.typography.font_families;
    let _ = writeln!(css, "  --font-heading: '{}', sans-serif;", fonts.heading);
    let _ = writeln!(css, "  --font-body: '{}', sans-serif;", fonts.body);
    css.push_str("}\n\nhtml {\n  scroll-behavior: smooth;\n}\n\nbody {\n  font-family: var(--font-body);\n}\n\nh1, h2, h3, h4, h5, h6 {\n  font-family: var(--font-heading);\n}\n");
    css
}

/// Display name for a scaffold file in progress events.
pub fn scaffold_component_name(path: &str) -> String {
    let stem = path.rsplit('/').next().unwrap_or(path);
    pascal_case(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn design() -> DesignSystem {
        serde_json::from_str(
            r##"{
                "colors": {
                    "primary": {"500": "#2563eb", "600": "#1d4ed8"},
                    "secondary": {"500": "#9333ea"},
                    "accent": {"500": "#f59e0b"},
                    "neutral": {"50": "#fafafa", "900": "#111827"}
                },
                "typography": {
                    "fontFamilies": {"heading": "Poppins", "body": "Inter"},
                    "scale": {"h1": {"size": "3rem", "lineHeight": "1.1", "weight": 800}}
                },
                "borderRadius": {"lg": "1rem"},
                "animations": {
                    "fadeIn": {"keyframes": {"0%": {"opacity": "0"}, "100%": {"opacity": "1"}}}
                }
            }"##,
        )
        .unwrap()
    }

    #[test]
    fn test_scaffold_paths_and_types() {
        let config = GenerationConfig {
            business_name: "Blue Fern Bakery & Co".into(),
            ..GenerationConfig::default()
        };
        let files = scaffold_files(&config, &design()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, SCAFFOLD_PATHS);

        let manifest: Value = serde_json::from_str(&files[0].content).unwrap();
        assert_eq!(manifest["name"], "blue-fern-bakery-co");

        let tokens: DesignSystem = serde_json::from_str(&files[6].content).unwrap();
        assert_eq!(tokens, design());
    }

    #[test]
    fn test_theme_extend() {
        let extend = theme_extend(&design());
        assert_eq!(extend["colors"]["primary"]["600"], "#1d4ed8");
        assert_eq!(extend["fontFamily"]["heading"][0], "Poppins");
        assert_eq!(extend["borderRadius"]["lg"], "1rem");
        assert!(extend.get("spacing").is_none());
        assert_eq!(extend["animation"]["fadeIn"], "fadeIn 0.6s ease-out both");
    }

    #[test]
    fn test_tailwind_config_embeds_theme() {
        let ts = tailwind_config(&design()).unwrap();
        assert!(ts.starts_with("import type { Config } from 'tailwindcss';"));
        assert!(ts.contains("content: ['./src/**/*.{js,ts,jsx,tsx,mdx}']"));
        assert!(ts.contains("\"heading\""));
        assert!(ts.trim_end().ends_with("export default config;"));
    }

    #[test]
    fn test_globals_css_variables() {
        let css = globals_css(&design());
        assert!(css.starts_with("@tailwind base;"));
        assert!(css.contains("--color-neutral-900: #111827;"));
        assert!(css.contains("--font-heading: 'Poppins', sans-serif;"));
    }

    #[test]
    fn test_component_names() {
        assert_eq!(scaffold_component_name("tailwind.config.ts"), "TailwindConfigTs");
        assert_eq!(scaffold_component_name("src/lib/design-system.json"), "DesignSystemJson");
    }
}
