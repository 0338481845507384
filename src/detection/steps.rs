use crate::pipeline::PipelineStep;
use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;

/// Smooths halftone and screentone texture before edge detection
pub struct BlurStep {
    pub sigma: f32,
}

impl PipelineStep for BlurStep {
    fn process(&self, image: GrayImage) -> GrayImage {
        gaussian_blur_f32(&image, self.sigma)
    }

    fn name(&self) -> &str {
        "Gaussian Blur"
    }
}

/// Canny edge map of the panel borders
pub struct EdgeDetectionStep {
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl PipelineStep for EdgeDetectionStep {
    fn process(&self, image: GrayImage) -> GrayImage {
        canny(&image, self.low_threshold, self.high_threshold)
    }

    fn name(&self) -> &str {
        "Edge Detection"
    }
}

/// Grows edge pixels by a square of `radius` so broken panel borders join
/// into one connected region. A zero radius passes the image through.
pub struct DilateStep {
    pub radius: u8,
}

impl PipelineStep for DilateStep {
    fn process(&self, image: GrayImage) -> GrayImage {
        if self.radius == 0 {
            return image;
        }
        dilate(&image, Norm::LInf, self.radius)
    }

    fn name(&self) -> &str {
        "Dilation"
    }
}
