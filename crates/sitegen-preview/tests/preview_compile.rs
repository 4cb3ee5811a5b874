//! End-to-end tests for the preview compiler over small generated sites.

use sitegen_core::files::VirtualFile;
use sitegen_preview::{PreviewError, compile_preview, render_preview};

const PAGE: &str = r#"'use client';
import Hero from '@/components/Hero';
import Testimonials from '@/components/Testimonials';
import Pricing from '@/components/Pricing';

export default function Home() {
  return (
    <main>
      <Hero />
      <Testimonials items={[1, 2]} />
      <Pricing />
    </main>
  );
}
"#;

const HERO: &str = r#"import { ArrowRight } from 'lucide-react';

export default function Hero() {
  return (
    <section className="py-24">
      <h1>Fresh bread daily</h1>
      <a href="/menu">See the menu <ArrowRight className="w-4 h-4" /></a>
    </section>
  );
}
"#;

const PRICING_TRUNCATED: &str = "export default function Pricing() {\n  return (\n    <section className=\"py-20\">\n      <h2>Plans";

const NAVBAR: &str = r#"import Link from 'next/link';

export default function Navbar() {
  return (
    <nav className="fixed top-0">
      <Link href="/">Acme</Link>
    </nav>
  );
}
"#;

const FOOTER: &str = "export default function Footer() {\n  return <footer>Acme Bakery</footer>;\n}\n";

const LAYOUT: &str = r#"import type { Metadata } from 'next';
import { Inter } from 'next/font/google';
import Navbar from '@/components/Navbar';
import Footer from '@/components/Footer';
import './globals.css';

const inter = Inter({ subsets: ['latin'] });

export const metadata: Metadata = { title: 'Acme' };

export default function RootLayout({ children }: { children: React.ReactNode }) {
  return (
    <html lang="en">
      <body className={inter.className}>
        <Navbar />
        {children}
        <Footer />
      </body>
    </html>
  );
}
"#;

const DESIGN: &str = r##"{
  "colors": {"primary": {"500": "#b45309"}},
  "typography": {"fontFamilies": {"heading": "Playfair Display", "body": "Inter"}}
}"##;

fn site() -> Vec<VirtualFile> {
    vec![
        VirtualFile::new("src/app/page.tsx", PAGE),
        VirtualFile::new("src/components/Hero.tsx", HERO),
        VirtualFile::new("src/components/Pricing.tsx", PRICING_TRUNCATED),
        VirtualFile::new("src/components/Navbar.tsx", NAVBAR),
        VirtualFile::new("src/components/Footer.tsx", FOOTER),
        VirtualFile::new("src/app/globals.css", "@tailwind base;\n@tailwind utilities;\n"),
        VirtualFile::new("src/lib/design-system.json", DESIGN),
    ]
}

#[test]
fn test_missing_component_is_removed() {
    let doc = compile_preview(&site(), "/").unwrap();
    assert!(!doc.source.contains("Testimonials"));
    assert!(doc.removed_components.contains("Testimonials"));
    assert!(doc.source.contains("const Hero = __require(\"src/components/Hero.tsx\").default;"));
    assert!(doc.source.contains("<Hero />"));
}

#[test]
fn test_icons_from_unreached_files_get_shims() {
    let files = vec![
        VirtualFile::new(
            "src/app/page.tsx",
            "export default function Home() {\n  return <h1>Acme</h1>;\n}\n",
        ),
        VirtualFile::new(
            "src/components/Reviews.tsx",
            "import { Star } from 'lucide-react';\n\nexport default function Reviews() {\n  return <Star />;\n}\n",
        ),
    ];
    let doc = compile_preview(&files, "/").unwrap();
    assert!(!doc.source.contains("src/components/Reviews.tsx"));
    assert!(doc.source.contains("__iconShims[\"Star\"] = __makeIcon(\"Star\", \"<"));
}

#[test]
fn test_missing_components_after_text_are_removed() {
    let page = r#"import Testimonials from '@/components/Testimonials';

export default function Home() {
  return (
    <main>
      <p>Loved by <Testimonials /></p>
      <h1>Welcome to <Brand /></h1>
      <p>Contact: <Missing /></p>
    </main>
  );
}
"#;
    let files = vec![VirtualFile::new("src/app/page.tsx", page)];
    let doc = compile_preview(&files, "/").unwrap();
    for name in ["Testimonials", "Brand", "Missing"] {
        assert!(doc.removed_components.contains(name), "{} not removed", name);
        assert!(!doc.source.contains(name), "{} still referenced", name);
    }
    assert!(doc.source.contains("<p>Loved by </p>"));
    assert!(doc.source.contains("<h1>Welcome to </h1>"));
    assert!(doc.source.contains("<p>Contact: </p>"));
}

#[test]
fn test_truncated_component_is_excluded() {
    let doc = compile_preview(&site(), "/").unwrap();
    assert_eq!(doc.excluded, vec!["src/components/Pricing.tsx".to_string()]);
    assert!(doc.removed_components.contains("Pricing"));
    assert!(!doc.source.contains("Pricing"));
    assert!(!doc.source.contains("<h2>Plans"));
}

#[test]
fn test_layout_synthesized_from_navbar_and_footer() {
    let doc = compile_preview(&site(), "/").unwrap();
    assert!(doc.source.contains("function __PreviewLayout(props) {"));
    assert!(doc.source.contains("__define(\"src/components/Navbar.tsx\""));
    assert!(doc.source.contains("__define(\"src/components/Footer.tsx\""));
    assert!(doc.source.contains("__mount(\"src/app/page.tsx\", __PreviewLayout);"));
}

#[test]
fn test_synthesized_layout_skips_chrome_the_page_renders() {
    let mut files = site();
    files[0] = VirtualFile::new(
        "src/app/page.tsx",
        "import Navbar from '@/components/Navbar';\n\nexport default function Home() {\n  return (\n    <>\n      <Navbar />\n      <h1>Hi</h1>\n    </>\n  );\n}\n",
    );
    let doc = compile_preview(&files, "/").unwrap();
    assert!(doc.source.contains(
        "React.createElement(React.Fragment, null, null, props.children, React.createElement(__require(\"src/components/Footer.tsx\").default));"
    ));
}

#[test]
fn test_existing_layout_is_used() {
    let mut files = site();
    files.push(VirtualFile::new("src/app/layout.tsx", LAYOUT));
    let doc = compile_preview(&files, "/").unwrap();
    assert!(doc.source.contains(
        "__mount(\"src/app/page.tsx\", __require(\"src/app/layout.tsx\").default);"
    ));
    assert!(!doc.source.contains("__PreviewLayout"));
    assert!(!doc.source.contains("<html"));
    assert!(doc.source.contains("<div className={inter.className}>"));
    assert!(doc.source.contains("const Inter = __import(\"next/font/google\")[\"Inter\"];"));
}

#[test]
fn test_icons_get_shims() {
    let doc = compile_preview(&site(), "/").unwrap();
    assert!(doc.source.contains("__iconShims[\"ArrowRight\"] = __makeIcon(\"ArrowRight\", \"<path"));
    assert!(doc.source.contains("const ArrowRight = __iconShims[\"ArrowRight\"];"));
}

#[test]
fn test_theme_and_styles_are_injected() {
    let doc = compile_preview(&site(), "/").unwrap();
    assert!(doc.html.contains("tailwind.config = {"));
    assert!(doc.html.contains("#b45309"));
    assert!(doc.html.contains("family=Playfair+Display"));
    assert!(doc.html.contains("<style type=\"text/tailwindcss\">@tailwind base;"));
}

#[test]
fn test_malformed_design_system_is_tolerated() {
    let mut files = site();
    files.retain(|f| f.path != "src/lib/design-system.json");
    files.push(VirtualFile::new("src/lib/design-system.json", "{\"colors\": {"));
    let doc = compile_preview(&files, "/").unwrap();
    assert!(doc.html.contains("tailwind.config = {"));
    assert!(doc.html.contains("fadeInUp"));
    assert!(!doc.html.contains("fonts.googleapis.com"));
}

#[test]
fn test_unknown_route_falls_back_to_root_page() {
    let doc = compile_preview(&site(), "/careers").unwrap();
    assert!(doc.fell_back);
    assert_eq!(doc.page_path, "src/app/page.tsx");

    let mut files = site();
    files.push(VirtualFile::new(
        "src/app/about/page.tsx",
        "export default function About() {\n  return <h1>About</h1>;\n}\n",
    ));
    let doc = compile_preview(&files, "/about").unwrap();
    assert!(!doc.fell_back);
    assert_eq!(doc.page_path, "src/app/about/page.tsx");
    assert!(doc.source.contains("__mount(\"src/app/about/page.tsx\""));
}

#[test]
fn test_components_and_exports_resolved_by_name() {
    let files = vec![
        VirtualFile::new(
            "src/app/page.tsx",
            "export default function Home() {\n  return <Hero />;\n}\n",
        ),
        VirtualFile::new(
            "src/components/Hero.tsx",
            "export default function Hero() {\n  return <ul>{plans.map((p) => <li key={p}>{p}</li>)}</ul>;\n}\n",
        ),
        VirtualFile::new("src/lib/data.ts", "export const plans = ['Basic', 'Pro'];\n"),
    ];
    let doc = compile_preview(&files, "/").unwrap();
    assert!(doc.source.contains("const Hero = __require(\"src/components/Hero.tsx\").default;"));
    assert!(doc.source.contains("const plans = __require(\"src/lib/data.ts\")[\"plans\"];"));
    assert!(doc.source.contains("return { default: undefined, \"plans\": plans };"));
    assert!(doc.source.ends_with("__mount(\"src/app/page.tsx\", null);\n"));
}

#[test]
fn test_json_modules() {
    let files = vec![
        VirtualFile::new(
            "src/app/page.tsx",
            "import team from '@/data/team.json';\n\nexport default function Home() {\n  return <p>{team.length}</p>;\n}\n",
        ),
        VirtualFile::new("src/data/team.json", "[{\"name\": \"Ada\"}]"),
    ];
    let doc = compile_preview(&files, "/").unwrap();
    assert!(doc.source.contains("const team = __require(\"src/data/team.json\").default;"));
    assert!(doc.source.contains("return { default: [{\"name\": \"Ada\"}] };"));
}

#[test]
fn test_script_terminators_are_escaped() {
    let files = vec![VirtualFile::new(
        "src/app/page.tsx",
        "export default function Home() {\n  return <p>{\"</script><script>alert(1)\"}</p>;\n}\n",
    )];
    let doc = compile_preview(&files, "/").unwrap();
    assert!(doc.source.contains("</script><script>alert(1)"));
    assert!(!doc.html.contains("</script><script>alert(1)"));
}

#[test]
fn test_nothing_to_render() {
    assert!(matches!(compile_preview(&[], "/"), Err(PreviewError::NoFiles)));

    let only_component = vec![VirtualFile::new("src/components/Hero.tsx", HERO)];
    assert!(matches!(
        compile_preview(&only_component, "/"),
        Err(PreviewError::NoPage { .. })
    ));

    let html = render_preview(&[], "/");
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Preview unavailable"));
    assert!(html.contains("version has no files"));
}
