/**
 * This module contains all logic for loading and packing external resources:
 * image-backed textures and OBJ triangle meshes.
 */
pub mod mesh;
pub mod texture;
