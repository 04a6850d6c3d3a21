// SPDX-License-Identifier: CEPL-1.0
use ash::vk;

use crate::driver::Driver;
use crate::error::{PipelineError, PipelineResult};
use crate::negotiate::PresentationChain;

pub fn view_create_info(image: vk::Image, format: vk::Format) -> vk::ImageViewCreateInfo<'static> {
    vk::ImageViewCreateInfo {
        s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
        image,
        view_type: vk::ImageViewType::TYPE_2D,
        format,
        components: vk::ComponentMapping::default(),
        subresource_range: vk::ImageSubresourceRange {
            aspect_mask: vk::ImageAspectFlags::COLOR,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        },
        ..Default::default()
    }
}

/// One view per chain image, same order as the images.
///
/// Each view goes to `on_created` as soon as it exists, so the views made
/// before a failure are still released by whoever tracks them.
pub fn create_views<D: Driver + ?Sized>(
    driver: &mut D,
    chain: &PresentationChain,
    mut on_created: impl FnMut(vk::ImageView),
) -> PipelineResult<Vec<vk::ImageView>> {
    let format = chain.format();
    let mut views = Vec::with_capacity(chain.images.len());
    for (index, &image) in chain.images.iter().enumerate() {
        let view = driver
            .create_image_view(&view_create_info(image, format))
            .map_err(|result| PipelineError::ViewCreationFailed { index, result })?;
        on_created(view);
        views.push(view);
    }
    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn full_single_level_color_view() {
        let image = vk::Image::from_raw(7);
        let info = view_create_info(image, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(info.image, image);
        assert_eq!(info.view_type, vk::ImageViewType::TYPE_2D);
        assert_eq!(info.format, vk::Format::B8G8R8A8_SRGB);
        let range = info.subresource_range;
        assert_eq!(range.aspect_mask, vk::ImageAspectFlags::COLOR);
        assert_eq!((range.base_mip_level, range.level_count), (0, 1));
        assert_eq!((range.base_array_layer, range.layer_count), (0, 1));
    }
}
