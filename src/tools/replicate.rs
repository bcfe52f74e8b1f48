//! Image generation via Replicate.

use anyhow::Result;
use serde::Deserialize;
use serde_json::json;

use crate::services::ServiceRegistry;
use crate::tools::core::{DynTool, Tool, ToolSpec};

pub fn tools() -> Vec<Box<dyn DynTool>> {
    vec![Box::new(GenerateImageTool)]
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageInput {
    pub prompt: String,
    #[serde(default)]
    pub image_inputs: Vec<String>,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

fn default_output_format() -> String {
    "jpg".to_string()
}

pub struct GenerateImageTool;

#[async_trait::async_trait]
impl Tool for GenerateImageTool {
    type Input = GenerateImageInput;

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "replicate_generate_image",
            description: "Generate or edit images using Google's nano-banana model on \
                Replicate. For text-to-image: provide only a prompt. For image editing: provide \
                a prompt describing the changes and imageInputs with the source image(s). \
                Returns the local file path where the generated image is saved.",
            parameters_schema: json!({
                "type": "object",
                "properties": {
                    "prompt": {
                        "type": "string",
                        "description": "Text description of the image to generate. Be specific and detailed for best results."
                    },
                    "imageInputs": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Local file paths of reference images for editing or multi-image fusion."
                    },
                    "aspectRatio": {
                        "type": "string",
                        "enum": [
                            "match_input_image", "1:1", "2:3", "3:2", "3:4", "4:3",
                            "4:5", "5:4", "9:16", "16:9", "21:9"
                        ],
                        "default": "1:1",
                        "description": "Aspect ratio for the output image. Use 'match_input_image' when editing to keep the original ratio."
                    },
                    "outputFormat": {
                        "type": "string",
                        "enum": ["jpg", "png"],
                        "default": "jpg",
                        "description": "Output image format. 'jpg' for smaller files, 'png' for transparency support."
                    }
                },
                "required": ["prompt"]
            }),
        }
    }

    async fn execute(&self, services: &ServiceRegistry, input: Self::Input) -> Result<String> {
        let replicate = services.replicate().await?;
        let result = replicate
            .generate_image(
                &input.prompt,
                &input.image_inputs,
                &input.aspect_ratio,
                &input.output_format,
            )
            .await?;
        Ok(serde_json::to_string_pretty(&result)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_defaults() {
        let input: GenerateImageInput =
            serde_json::from_value(json!({ "prompt": "a quiet harbor at dawn" })).unwrap();
        assert!(input.image_inputs.is_empty());
        assert_eq!(input.aspect_ratio, "1:1");
        assert_eq!(input.output_format, "jpg");
    }
}
