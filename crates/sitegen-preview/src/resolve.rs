//! Path resolution: import specifiers to files, routes to page sources.

use sitegen_core::files::{VirtualFile, normalize_route};

/// Source extensions tried in order when a specifier omits one.
pub const SOURCE_EXTENSIONS: [&str; 4] = ["tsx", "ts", "jsx", "js"];

pub fn has_source_extension(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    name.rsplit_once('.')
        .is_some_and(|(stem, ext)| !stem.is_empty() && SOURCE_EXTENSIONS.contains(&ext))
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Join `relative` onto `base`, folding `.` and `..` segments.
fn join(base: &str, relative: &str) -> String {
    let mut parts: Vec<&str> = base.split('/').filter(|p| !p.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    parts.join("/")
}

/// Resolve an import specifier written in `from` to a path accepted by
/// `exists`. `@/` and `~/` map to `src/`.
pub fn resolve_specifier(from: &str, specifier: &str, exists: impl Fn(&str) -> bool) -> Option<String> {
    let base = if let Some(rest) = specifier
        .strip_prefix("@/")
        .or_else(|| specifier.strip_prefix("~/"))
    {
        join("src", rest)
    } else if specifier.starts_with("./") || specifier.starts_with("../") {
        join(parent_dir(from), specifier)
    } else {
        return None;
    };

    if (has_source_extension(&base) || base.ends_with(".json")) && exists(&base) {
        return Some(base);
    }
    SOURCE_EXTENSIONS
        .iter()
        .map(|ext| format!("{}.{}", base, ext))
        .chain(SOURCE_EXTENSIONS.iter().map(|ext| format!("{}/index.{}", base, ext)))
        .find(|candidate| exists(candidate))
}

/// Logical route served by a page source, if the path is a page.
///
/// Handles the app router (`src/app/about/page.tsx`, route groups like
/// `(marketing)` are transparent) and the pages router
/// (`src/pages/about.tsx`, `src/pages/index.tsx`).
pub fn route_for_page(path: &str) -> Option<String> {
    if !has_source_extension(path) {
        return None;
    }
    let (dir, file) = path.rsplit_once('/').unwrap_or(("", path));
    let stem = file.split_once('.').map_or(file, |(s, _)| s);

    if let Some(app_dir) = ["src/app", "app"].iter().find(|root| {
        dir == **root || dir.starts_with(&format!("{}/", root))
    }) {
        if stem != "page" {
            return None;
        }
        let route: Vec<&str> = dir[app_dir.len()..]
            .split('/')
            .filter(|s| !s.is_empty() && !(s.starts_with('(') && s.ends_with(')')))
            .collect();
        return Some(normalize_route(&route.join("/")));
    }

    for root in ["src/pages", "pages"] {
        if let Some(rest) = path.strip_prefix(root).and_then(|r| r.strip_prefix('/')) {
            let without_ext = rest.rsplit_once('.').map_or(rest, |(p, _)| p);
            if without_ext.starts_with('_') || without_ext.starts_with("api/") {
                return None;
            }
            let route = without_ext.strip_suffix("index").unwrap_or(without_ext);
            return Some(normalize_route(route));
        }
    }
    None
}

/// Page for `route`, falling back to the root page. The flag is true when
/// the fallback was used.
pub fn resolve_page<'a>(files: &'a [VirtualFile], route: &str) -> Option<(&'a VirtualFile, bool)> {
    let wanted = normalize_route(route);
    let find = |target: &str| {
        files
            .iter()
            .find(|f| route_for_page(&f.path).as_deref() == Some(target))
    };
    if let Some(page) = find(&wanted) {
        return Some((page, false));
    }
    find("/").map(|page| (page, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exists(paths: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |p| paths.iter().any(|known| *known == p)
    }

    #[test]
    fn test_resolve_specifiers() {
        let files = exists(&[
            "src/components/Hero.tsx",
            "src/components/ui/index.ts",
            "src/lib/utils.ts",
            "src/data/plans.json",
        ]);
        assert_eq!(
            resolve_specifier("src/app/page.tsx", "@/components/Hero", &files).as_deref(),
            Some("src/components/Hero.tsx")
        );
        assert_eq!(
            resolve_specifier("src/components/Hero.tsx", "./ui", &files).as_deref(),
            Some("src/components/ui/index.ts")
        );
        assert_eq!(
            resolve_specifier("src/components/ui/index.ts", "../../lib/utils", &files).as_deref(),
            Some("src/lib/utils.ts")
        );
        assert_eq!(
            resolve_specifier("src/app/page.tsx", "@/components/Hero.tsx", &files).as_deref(),
            Some("src/components/Hero.tsx")
        );
        assert_eq!(
            resolve_specifier("src/app/page.tsx", "@/data/plans.json", &files).as_deref(),
            Some("src/data/plans.json")
        );
        assert_eq!(resolve_specifier("src/app/page.tsx", "@/components/Blog", &files), None);
        assert_eq!(resolve_specifier("src/app/page.tsx", "react", &files), None);
    }

    #[test]
    fn test_routes() {
        assert_eq!(route_for_page("src/app/page.tsx").as_deref(), Some("/"));
        assert_eq!(route_for_page("src/app/about/page.tsx").as_deref(), Some("/about"));
        assert_eq!(
            route_for_page("src/app/(marketing)/pricing/page.jsx").as_deref(),
            Some("/pricing")
        );
        assert_eq!(route_for_page("src/app/layout.tsx"), None);
        assert_eq!(route_for_page("src/pages/index.tsx").as_deref(), Some("/"));
        assert_eq!(route_for_page("src/pages/contact.tsx").as_deref(), Some("/contact"));
        assert_eq!(route_for_page("src/pages/_app.tsx"), None);
        assert_eq!(route_for_page("src/components/Hero.tsx"), None);
    }

    #[test]
    fn test_page_fallback() {
        let files = vec![
            VirtualFile::new("src/app/page.tsx", "home"),
            VirtualFile::new("src/app/about/page.tsx", "about"),
        ];
        let (page, fell_back) = resolve_page(&files, "/about/").unwrap();
        assert_eq!((page.content.as_str(), fell_back), ("about", false));
        let (page, fell_back) = resolve_page(&files, "/careers").unwrap();
        assert_eq!((page.content.as_str(), fell_back), ("home", true));
        assert!(resolve_page(&files[1..], "/careers").is_none());
    }
}
