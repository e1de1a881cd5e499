use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    parse2,
    token::Comma,
    Ident, LitStr, Result,
};

struct SceneMain {
    id: Ident,
    config_path: LitStr,
}

impl Parse for SceneMain {
    fn parse(input: ParseStream) -> Result<Self> {
        let config_path: LitStr = input.parse()?;
        let _comma: Comma = input.parse()?;
        let id = input.parse()?;
        let _trailing: Option<Comma> = input.parse()?;

        Ok(Self { id, config_path })
    }
}

fn scene_main_impl(input: TokenStream) -> TokenStream {
    let SceneMain { id, config_path } = match parse2(input) {
        Ok(scene_main) => scene_main,
        Err(err) => return err.to_compile_error(),
    };

    quote! {
        #[cfg(target_arch = "wasm32")]
        use wasm_bindgen::prelude::*;

        #[cfg(target_arch = "wasm32")]
        #[wasm_bindgen(js_name = "sceneMain")]
        pub fn scene_main() {
            orbitgraphs::scene_main::<#id>(include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                #config_path
            )));
        }

        #[cfg(not(target_arch = "wasm32"))]
        pub fn scene_main() -> anyhow::Result<()> {
            orbitgraphs::scene_main::<#id>(include_str!(concat!(
                env!("CARGO_MANIFEST_DIR"),
                #config_path
            )))
        }
    }
}

// Macro parameters:
//   str literal containing path to the scene TOML (concat'd to CARGO_MANIFEST_DIR)
//   identifier of the type implementing orbitgraphs::scene::Scene
// Generates `scene_main`, exported to JavaScript as `sceneMain` in the browser
#[proc_macro]
pub fn scene_main(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    scene_main_impl(input.into()).into()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_path_and_type() {
        let scene: SceneMain = parse2(quote! { "/res/kitten.toml", KittenScene }).unwrap();
        assert_eq!("/res/kitten.toml", scene.config_path.value());
        assert_eq!("KittenScene", scene.id.to_string());
    }

    #[test]
    fn accepts_trailing_comma() {
        assert!(parse2::<SceneMain>(quote! { "/res/kitten.toml", KittenScene, }).is_ok());
    }

    #[test]
    fn rejects_missing_type() {
        assert!(parse2::<SceneMain>(quote! { "/res/kitten.toml" }).is_err());
    }

    #[test]
    fn expansion_mentions_scene_type() {
        let expanded = scene_main_impl(quote! { "/res/kitten.toml", KittenScene }).to_string();
        assert!(expanded.contains("KittenScene"));
        assert!(expanded.contains("sceneMain"));
    }
}
